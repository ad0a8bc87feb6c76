// commands/mod.rs
use std::sync::Arc;
use tracing::{debug, info};

use crate::metrics::SyncObserver;
use crate::models::Command;
use crate::remote::RemoteSource;

/// Fire-and-forget delivery of commands to the store.
///
/// Nothing is returned to the caller; a failed send goes to the observer and
/// is never retried. Sends are not ordered against each other or against
/// polling.
#[derive(Clone)]
pub struct CommandDispatcher {
    remote: Arc<dyn RemoteSource>,
    observer: Arc<dyn SyncObserver>,
}

impl CommandDispatcher {
    pub fn new(remote: Arc<dyn RemoteSource>, observer: Arc<dyn SyncObserver>) -> Self {
        Self { remote, observer }
    }

    pub fn send(&self, command: Command) {
        info!(
            device_id = %command.device_id,
            command = %command.command,
            value = %command.value,
            "sending command"
        );
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(command).await });
    }

    pub(crate) async fn deliver(&self, command: Command) {
        match self.remote.send_command(&command).await {
            Ok(()) => debug!(device_id = %command.device_id, "command delivered"),
            Err(e) => self.observer.command_failed(&command, &e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testing::CountingObserver;
    use crate::models::CommandName;
    use crate::remote::testing::FakeRemote;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[tokio::test]
    async fn send_reaches_the_remote() {
        let remote = Arc::new(FakeRemote::default());
        let observer = Arc::new(CountingObserver::default());
        let dispatcher = CommandDispatcher::new(remote.clone(), observer.clone());

        dispatcher.send(Command::new("lamp1", CommandName::SetColor, "#ff0000"));

        let sent = tokio::time::timeout(Duration::from_secs(1), remote.wait_for_commands(1))
            .await
            .unwrap();
        assert_eq!(sent[0].command, CommandName::SetColor);
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let remote = Arc::new(FakeRemote::default());
        remote.fail_commands.store(true, Ordering::SeqCst);
        let observer = Arc::new(CountingObserver::default());
        let dispatcher = CommandDispatcher::new(remote.clone(), observer.clone());

        dispatcher
            .deliver(Command::new("lock1", CommandName::SetStatus, "UNLOCKED"))
            .await;
        dispatcher
            .deliver(Command::new("lock1", CommandName::SetStatus, "LOCKED"))
            .await;

        assert_eq!(observer.command_failures(), 2);
        assert_eq!(remote.sent().len(), 2);
    }
}
