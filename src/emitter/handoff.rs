use super::PaceError;
use crate::splitter::UnitScanner;
use bytes::Bytes;
use kanal::{AsyncReceiver, AsyncSender, bounded_async};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::debug;

/// Message passed from the producer task to the emitter
#[derive(Debug)]
enum Message {
    Unit(Bytes),
    /// End of stream
    Eos,
    Failed(PaceError),
}

/// Receiving end of a single-producer single-consumer unit queue
///
/// The scanner runs in its own task and pushes units in stream order.
/// Dropping the queue stops the producer.
pub struct UnitQueue {
    name: String,
    messages: AsyncReceiver<Message>,
    producer: JoinHandle<()>,
}

impl UnitQueue {
    /// Spawn a producer task draining `scanner` into a queue of `capacity`
    ///
    /// A capacity of zero makes every hand-off a rendezvous.
    pub fn spawn<R>(scanner: UnitScanner<R>, capacity: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let name = scanner.name().to_string();
        let (sender, messages) = bounded_async(capacity);
        let producer = tokio::spawn(produce(scanner, sender));

        Self {
            name,
            messages,
            producer,
        }
    }

    pub async fn next_unit(&mut self) -> Result<Option<Bytes>, PaceError> {
        match self.messages.recv().await {
            Ok(Message::Unit(unit)) => Ok(Some(unit)),
            Ok(Message::Eos) => Ok(None),
            Ok(Message::Failed(err)) => Err(err),
            Err(_) => Err(PaceError::ProducerFailed {
                name: self.name.clone(),
            }),
        }
    }
}

impl Drop for UnitQueue {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

async fn produce<R>(mut scanner: UnitScanner<R>, messages: AsyncSender<Message>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let message = match scanner.next_unit().await {
            Ok(Some(unit)) => Message::Unit(unit),
            Ok(None) => Message::Eos,
            Err(err) => Message::Failed(err),
        };
        let last = !matches!(message, Message::Unit(_));

        if messages.send(message).await.is_err() {
            debug!(source = scanner.name(), "unit consumer went away");
            return;
        }
        if last {
            return;
        }
    }
}
