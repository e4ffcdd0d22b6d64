use crate::resource::{Channel, Node, Pipe, Window};

/// Whether a container is visited before or after its children
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitOrder {
    Pre,
    Post,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VisitorResult {
    Continue,
    /// Skips the children and the post visit of the current resource
    Prune,
    /// Stops the traversal
    Terminate,
}

/// Traversal of a config's resource tree. Containers are visited twice,
/// channels once.
pub trait ConfigVisitor {
    fn visit_node(&mut self, _node: &mut Node, _order: VisitOrder) -> VisitorResult {
        VisitorResult::Continue
    }

    fn visit_pipe(&mut self, _pipe: &mut Pipe, _order: VisitOrder) -> VisitorResult {
        VisitorResult::Continue
    }

    fn visit_window(&mut self, _window: &mut Window, _order: VisitOrder) -> VisitorResult {
        VisitorResult::Continue
    }

    fn visit_channel(&mut self, _channel: &mut Channel) -> VisitorResult {
        VisitorResult::Continue
    }
}

/// Runs the children of a container between its pre and post visits
fn traverse<R, F, C>(
    resource: &mut R,
    visitor: &mut dyn ConfigVisitor,
    mut visit: F,
    children: C,
) -> VisitorResult
where
    F: FnMut(&mut dyn ConfigVisitor, &mut R, VisitOrder) -> VisitorResult,
    C: FnOnce(&mut R, &mut dyn ConfigVisitor) -> VisitorResult,
{
    match visit(&mut *visitor, &mut *resource, VisitOrder::Pre) {
        VisitorResult::Terminate => return VisitorResult::Terminate,
        VisitorResult::Prune => return VisitorResult::Continue,
        VisitorResult::Continue => {}
    }
    if children(&mut *resource, &mut *visitor) == VisitorResult::Terminate {
        return VisitorResult::Terminate;
    }
    match visit(visitor, resource, VisitOrder::Post) {
        VisitorResult::Terminate => VisitorResult::Terminate,
        _ => VisitorResult::Continue,
    }
}

fn accept_all<T>(
    children: &mut [T],
    visitor: &mut dyn ConfigVisitor,
    accept: fn(&mut T, &mut dyn ConfigVisitor) -> VisitorResult,
) -> VisitorResult {
    for child in children {
        if accept(child, &mut *visitor) == VisitorResult::Terminate {
            return VisitorResult::Terminate;
        }
    }
    VisitorResult::Continue
}

impl Node {
    pub fn accept(&mut self, visitor: &mut dyn ConfigVisitor) -> VisitorResult {
        traverse(
            self,
            visitor,
            |visitor, node, order| visitor.visit_node(node, order),
            |node, visitor| accept_all(node.pipes_mut(), visitor, Pipe::accept),
        )
    }
}

impl Pipe {
    pub fn accept(&mut self, visitor: &mut dyn ConfigVisitor) -> VisitorResult {
        traverse(
            self,
            visitor,
            |visitor, pipe, order| visitor.visit_pipe(pipe, order),
            |pipe, visitor| accept_all(pipe.windows_mut(), visitor, Window::accept),
        )
    }
}

impl Window {
    pub fn accept(&mut self, visitor: &mut dyn ConfigVisitor) -> VisitorResult {
        traverse(
            self,
            visitor,
            |visitor, window, order| visitor.visit_window(window, order),
            |window, visitor| accept_all(window.channels_mut(), visitor, Channel::accept),
        )
    }
}

impl Channel {
    pub fn accept(&mut self, visitor: &mut dyn ConfigVisitor) -> VisitorResult {
        match visitor.visit_channel(self) {
            VisitorResult::Terminate => VisitorResult::Terminate,
            _ => VisitorResult::Continue,
        }
    }
}
