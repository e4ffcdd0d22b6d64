mod canonical;
mod key_table;
mod pointer;
mod remote;
mod translator;

pub use canonical::{Event, KeyCode, MagellanEvent, PointerButtons, PointerEvent};
pub use key_table::key_from_qt;
pub use pointer::{PointerAction, PointerTracker};
pub use remote::{EventSource, RemoteEvent, RemoteEventKind};
pub use translator::{typed_char, EventTranslator, TranslatorKey, TranslatorRegistry, WHEEL_FACTOR};
