//! Bounded command channel
//!
//! Many producers, one consumer. Producers block while the channel is full;
//! nothing is dropped, merged or reordered.

use crate::error::{PlaybackError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tapedeck_core::Command;

/// Default channel capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;

/// Constructor for the command channel pair
pub struct CommandChannel;

impl CommandChannel {
    /// Create a channel holding at most `capacity` queued commands
    ///
    /// A zero capacity is raised to 1.
    pub fn bounded(capacity: usize) -> (CommandSender, CommandReceiver) {
        let (tx, rx) = bounded(capacity.max(1));
        (CommandSender { tx }, CommandReceiver { rx })
    }
}

/// Producer handle; clone one per producer
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Queue a command, blocking while the channel is full
    ///
    /// # Errors
    /// Returns `ChannelClosed` once the consumer is gone
    pub fn enqueue(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| PlaybackError::ChannelClosed)
    }

    /// Commands waiting to be consumed
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Consumer handle
#[derive(Debug)]
pub struct CommandReceiver {
    rx: Receiver<Command>,
}

impl CommandReceiver {
    /// Next command, blocking until one arrives
    ///
    /// Returns `None` once every sender is dropped and the queue is empty.
    pub fn dequeue(&self) -> Option<Command> {
        self.rx.recv().ok()
    }

    /// Next command, waiting at most `timeout`
    ///
    /// # Errors
    /// `Timeout` if nothing arrived, `ChannelClosed` if every sender is gone
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<Command> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => PlaybackError::Timeout,
            RecvTimeoutError::Disconnected => PlaybackError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn preserves_fifo_order() {
        let (tx, rx) = CommandChannel::bounded(8);
        for command in Command::ALL {
            tx.enqueue(command).unwrap();
        }
        drop(tx);

        let received: Vec<Command> = std::iter::from_fn(|| rx.dequeue()).collect();
        assert_eq!(received, Command::ALL.to_vec());
    }

    #[test]
    fn full_channel_blocks_producer() {
        let (tx, rx) = CommandChannel::bounded(1);
        tx.enqueue(Command::Next).unwrap();

        let sent = Arc::new(AtomicBool::new(false));
        let producer = {
            let tx = tx.clone();
            let sent = Arc::clone(&sent);
            thread::spawn(move || {
                tx.enqueue(Command::Previous).unwrap();
                sent.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!sent.load(Ordering::SeqCst), "producer should be blocked");

        assert_eq!(rx.dequeue(), Some(Command::Next));
        producer.join().unwrap();
        assert!(sent.load(Ordering::SeqCst));
        assert_eq!(rx.dequeue(), Some(Command::Previous));
    }

    #[test]
    fn enqueue_fails_after_consumer_drops() {
        let (tx, rx) = CommandChannel::bounded(2);
        drop(rx);
        assert!(matches!(
            tx.enqueue(Command::Stop),
            Err(PlaybackError::ChannelClosed)
        ));
    }

    #[test]
    fn dequeue_timeout_reports_empty_queue() {
        let (_tx, rx) = CommandChannel::bounded(2);
        assert!(matches!(
            rx.dequeue_timeout(Duration::from_millis(10)),
            Err(PlaybackError::Timeout)
        ));
    }
}
