use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};

use crate::{
    connection::{decode_batch, Connection, ConnectionError},
    protocol::Packet,
    types::ObjectId,
};

use super::{
    command_table::{CommandResult, CommandTable},
    error::DispatchError,
};

/// Routes inbound packets to the command table of their target object.
///
/// Tables are registered and removed by the issuing thread while the
/// receiver thread dispatches, so lookups clone the table handle and run the
/// handler without holding the registry lock.
#[derive(Default)]
pub struct CommandDispatcher {
    tables: RwLock<HashMap<ObjectId, Arc<CommandTable>>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, target: ObjectId, table: CommandTable) -> Result<(), DispatchError> {
        let mut tables = self.tables.write().map_err(|_| DispatchError::LockPoisoned)?;
        if tables.contains_key(&target) {
            return Err(DispatchError::AlreadyRegistered { target });
        }
        debug!("CommandDispatcher: Registering commands of {}", target);
        tables.insert(target, Arc::new(table));
        Ok(())
    }

    /// Removes the table of `target`, returns whether one was registered
    pub fn deregister(&self, target: ObjectId) -> bool {
        match self.tables.write() {
            Ok(mut tables) => tables.remove(&target).is_some(),
            Err(_) => false,
        }
    }

    pub fn is_registered(&self, target: ObjectId) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(&target))
            .unwrap_or(false)
    }

    pub fn dispatch(&self, packet: &Packet) -> Result<(), DispatchError> {
        let table = self
            .tables
            .read()
            .map_err(|_| DispatchError::LockPoisoned)?
            .get(&packet.target)
            .cloned()
            .ok_or(DispatchError::UnknownTarget {
                target: packet.target,
            })?;

        let code = packet.code();
        let handler = table.handler(code).ok_or(DispatchError::UnhandledCommand {
            target: packet.target,
            code,
        })?;

        match handler(packet) {
            CommandResult::Handled => Ok(()),
            CommandResult::Error(message) => Err(DispatchError::HandlerFailed {
                target: packet.target,
                code,
                message,
            }),
        }
    }

    /// Dispatches every packet of a received batch, in order. A packet that
    /// cannot be delivered is logged and skipped; the rest of the batch is
    /// still delivered. Returns the number of packets that were handled.
    pub fn dispatch_batch(&self, bytes: &[u8]) -> Result<usize, DispatchError> {
        let packets = decode_batch(bytes)?;
        let mut handled = 0;
        for packet in &packets {
            match self.dispatch(packet) {
                Ok(()) => handled += 1,
                Err(error) => warn!("CommandDispatcher: {}", error),
            }
        }
        Ok(handled)
    }

    /// Runs the receive loop for `connection` on its own thread until the
    /// connection closes
    pub fn spawn_receiver(
        self: &Arc<Self>,
        connection: Arc<dyn Connection>,
    ) -> JoinHandle<Result<(), DispatchError>> {
        let dispatcher = self.clone();
        thread::spawn(move || dispatcher.receive_loop(connection.as_ref()))
    }

    pub fn receive_loop(&self, connection: &dyn Connection) -> Result<(), DispatchError> {
        loop {
            let bytes = match connection.receive() {
                Ok(bytes) => bytes,
                Err(ConnectionError::Closed { description }) => {
                    info!("CommandDispatcher: {} closed", description);
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            };
            if let Err(error) = self.dispatch_batch(&bytes) {
                warn!("CommandDispatcher: dropping batch: {}", error);
            }
        }
    }
}
