//! Session state: the open store and command execution.

use revstore_core::{
    ConditionalRead, EraseRecord, Error, ResourceKey, VersionRecord, WriteResult,
};
use revstore_engine::{EraseRequest, ResourceStore, StoreInfo};

use crate::parse::StoreCommand;

/// Result of one command.
#[derive(Debug)]
pub enum Output {
    Written(WriteResult),
    Erased(EraseRecord),
    Read(ConditionalRead),
    History {
        key: ResourceKey,
        versions: Vec<VersionRecord>,
    },
    Keys(Vec<ResourceKey>),
    Flushed,
    Compacted { journal_bytes: u64 },
    Info(StoreInfo),
}

/// An open store plus anything a REPL session remembers.
pub struct SessionState {
    store: ResourceStore,
}

impl SessionState {
    pub fn new(store: ResourceStore) -> Self {
        Self { store }
    }

    pub fn flush(&self) -> Result<(), Error> {
        self.store.flush()
    }

    pub fn execute(&self, command: StoreCommand) -> Result<Output, Error> {
        let store = &self.store;
        match command {
            StoreCommand::Create {
                resource_type,
                id: Some(id),
                payload,
            } => store
                .create_with_id(&ResourceKey::new(resource_type, id), payload)
                .map(Output::Written),
            StoreCommand::Create {
                resource_type,
                id: None,
                payload,
            } => store.create(&resource_type, payload).map(Output::Written),
            StoreCommand::Update {
                key,
                payload,
                precondition,
            } => store.update(&key, payload, precondition).map(Output::Written),
            StoreCommand::Delete { key, precondition } => {
                store.delete(&key, precondition).map(Output::Written)
            }
            StoreCommand::Erase { key, reason } => {
                let request = match reason {
                    Some(reason) => EraseRequest::with_reason(reason),
                    None => EraseRequest::new(),
                };
                store.erase(&key, request).map(Output::Erased)
            }
            StoreCommand::Read { key, condition } => {
                store.read_conditional(&key, condition).map(Output::Read)
            }
            StoreCommand::Vread { key, version_id } => store
                .vread(&key, version_id)
                .map(|read| Output::Read(ConditionalRead::Modified(read))),
            StoreCommand::History { key, query } => {
                let versions = store.history(&key, query)?;
                Ok(Output::History { key, versions })
            }
            StoreCommand::List { resource_type } => {
                Ok(Output::Keys(store.keys_of_type(&resource_type)))
            }
            StoreCommand::Flush => store.flush().map(|_| Output::Flushed),
            StoreCommand::Compact => store
                .compact()
                .map(|journal_bytes| Output::Compacted { journal_bytes }),
            StoreCommand::Info => Ok(Output::Info(store.info())),
        }
    }
}
