//! One-way outbound channel from the game runtime
//!
//! Delivery is synchronous and in send order on the calling thread. There is
//! exactly one subscriber for the lifetime of the port.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("save port already has a subscriber")]
    AlreadySubscribed,
}

/// Runtime-owned port emitting every state worth saving
pub struct SavePort<S> {
    subscriber: Option<Box<dyn FnMut(&S)>>,
}

impl<S> Default for SavePort<S> {
    fn default() -> Self {
        Self { subscriber: None }
    }
}

impl<S> fmt::Debug for SavePort<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavePort")
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

impl<S> SavePort<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the single consumer
    pub fn subscribe(&mut self, handler: impl FnMut(&S) + 'static) -> Result<(), PortError> {
        if self.subscriber.is_some() {
            return Err(PortError::AlreadySubscribed);
        }
        self.subscriber = Some(Box::new(handler));
        Ok(())
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_some()
    }

    /// Deliver `state` to the subscriber before returning
    pub fn send(&mut self, state: &S) {
        match self.subscriber.as_mut() {
            Some(handler) => handler(state),
            None => log::debug!("Save port has no subscriber, state dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_send_delivers_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut port = SavePort::new();
        let sink = seen.clone();
        port.subscribe(move |n: &u32| sink.borrow_mut().push(*n)).unwrap();

        for n in 1..=5 {
            port.send(&n);
        }
        assert_eq!(*seen.borrow(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_second_subscriber_rejected() {
        let mut port = SavePort::<u32>::new();
        port.subscribe(|_| {}).unwrap();
        assert_eq!(port.subscribe(|_| {}), Err(PortError::AlreadySubscribed));
        assert!(port.is_subscribed());
    }

    #[test]
    fn test_send_without_subscriber_is_dropped() {
        let mut port = SavePort::<u32>::new();
        assert!(!port.is_subscribed());
        port.send(&7);
    }
}
