use std::sync::{Mutex, PoisonError, mpsc};

/// Message relay from worker threads to the thread that owns the receiver.
///
/// Workers hold [`NotifierSender`]s; the owner drains the queue once per
/// frame. Messages from one sender arrive in the order they were sent.
/// The receiver sits behind a mutex only so the notifier can be shared;
/// there is a single consumer.
pub struct Notifier<M> {
    tx: mpsc::Sender<M>,
    rx: Mutex<mpsc::Receiver<M>>,
}

/// Sending half of a [`Notifier`].
pub struct NotifierSender<M> {
    tx: mpsc::Sender<M>,
}

impl<M> Clone for NotifierSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> NotifierSender<M> {
    /// Never blocks. Messages sent after the notifier is gone are dropped.
    pub fn send(&self, message: M) {
        if self.tx.send(message).is_err() {
            log::trace!("Notifier closed, message dropped");
        }
    }
}

impl<M> Default for Notifier<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Notifier<M> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    pub fn sender(&self) -> NotifierSender<M> {
        NotifierSender {
            tx: self.tx.clone(),
        }
    }

    /// Hand every message queued right now to `handler`, without waiting
    /// for more. Returns how many were handled.
    /// The handler runs after the receiver is unlocked, so it may drain
    /// again.
    pub fn drain(&self, handler: impl FnMut(M)) -> usize {
        let pending: Vec<M> = self
            .rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_iter()
            .collect();
        let count = pending.len();
        pending.into_iter().for_each(handler);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_send_order() {
        let notifier = Notifier::new();
        let sender = notifier.sender();
        for i in 0..5 {
            sender.send(i);
        }
        let mut got = Vec::new();
        assert_eq!(notifier.drain(|m| got.push(m)), 5);
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
        assert_eq!(notifier.drain(|_: i32| panic!("queue should be empty")), 0);
    }

    #[test]
    fn per_thread_order_survives_interleaving() {
        let notifier = Notifier::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sender = notifier.sender();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sender.send((t, i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let mut last = [None::<i32>; 4];
        let count = notifier.drain(|(t, i)| {
            let prev = last[t as usize].replace(i);
            assert!(prev.is_none_or(|p| p < i));
        });
        assert_eq!(count, 200);
    }

    #[test]
    fn send_after_drop_is_ignored() {
        let notifier = Notifier::<u8>::new();
        let sender = notifier.sender();
        drop(notifier);
        sender.send(1);
    }
}
