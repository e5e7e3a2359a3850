//! # Event Broadcasting
//!
//! A [`Broadcaster<C, P>`] is an ordered list of listeners. Each listener gets
//! a mutable context `C` (for the shop, that is the set of repositories) and a
//! payload `P`. [`Signal<C>`] is the payload-free flavour.
//!
//! ## Rules
//!
//! - Listeners run synchronously, on the caller's thread, in registration order.
//! - Adding the same closure twice registers it twice.
//! - Removing an unknown [`ListenerId`] does nothing.
//! - Listeners never see the broadcaster, so they cannot add or remove
//!   listeners while a broadcast is running.
//! - A failing listener does not stop the others. Every failure is logged and
//!   all of them are returned together as [`ShopError::Broadcast`].

use crate::error::{Result, ShopError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<C, P> = Box<dyn FnMut(&mut C, &P) -> Result<()>>;

pub struct Broadcaster<C, P> {
    event: &'static str,
    next_id: u64,
    listeners: Vec<(ListenerId, Listener<C, P>)>,
}

pub type Signal<C> = Broadcaster<C, ()>;

impl<C, P> Broadcaster<C, P> {
    pub fn new(event: &'static str) -> Self {
        Self {
            event,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&mut C, &P) -> Result<()> + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether a listener was removed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn broadcast(&mut self, ctx: &mut C, payload: &P) -> Result<()> {
        let mut failures = Vec::new();

        for (id, listener) in self.listeners.iter_mut() {
            if let Err(e) = listener(ctx, payload) {
                tracing::warn!(event = self.event, listener = id.0, error = %e, "listener failed");
                failures.push(e);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShopError::Broadcast {
                event: self.event,
                failures,
            })
        }
    }
}

impl<C> Broadcaster<C, ()> {
    pub fn emit(&mut self, ctx: &mut C) -> Result<()> {
        self.broadcast(ctx, &())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_run_in_registration_order() {
        let mut b: Broadcaster<Vec<&'static str>, u32> = Broadcaster::new("test");
        b.add_listener(|log, _| {
            log.push("L1");
            Ok(())
        });
        b.add_listener(|log, _| {
            log.push("L2");
            Ok(())
        });
        b.add_listener(|log, _| {
            log.push("L3");
            Ok(())
        });

        let mut log = Vec::new();
        b.broadcast(&mut log, &7).unwrap();
        assert_eq!(log, vec!["L1", "L2", "L3"]);
    }

    #[test]
    fn payload_reaches_every_listener() {
        let mut b: Broadcaster<Vec<u32>, u32> = Broadcaster::new("test");
        b.add_listener(|seen, n| {
            seen.push(*n);
            Ok(())
        });
        b.add_listener(|seen, n| {
            seen.push(n * 10);
            Ok(())
        });

        let mut seen = Vec::new();
        b.broadcast(&mut seen, &4).unwrap();
        assert_eq!(seen, vec![4, 40]);
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        fn bump(count: &mut u32, _: &()) -> Result<()> {
            *count += 1;
            Ok(())
        }

        let mut s: Signal<u32> = Signal::new("tick");
        s.add_listener(bump);
        s.add_listener(bump);

        let mut count = 0;
        s.emit(&mut count).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn remove_listener() {
        let mut s: Signal<u32> = Signal::new("tick");
        let first = s.add_listener(|n, _| {
            *n += 1;
            Ok(())
        });
        s.add_listener(|n, _| {
            *n += 100;
            Ok(())
        });

        assert!(s.remove_listener(first));
        assert!(!s.remove_listener(first));
        assert_eq!(s.len(), 1);

        let mut n = 0;
        s.emit(&mut n).unwrap();
        assert_eq!(n, 100);
    }

    #[test]
    fn failures_are_collected_and_others_still_run() {
        let mut b: Broadcaster<Vec<&'static str>, ()> = Broadcaster::new("vehicle registered");
        b.add_listener(|log, _| {
            log.push("first");
            Err(ShopError::Invalid("boom".into()))
        });
        b.add_listener(|log, _| {
            log.push("second");
            Ok(())
        });
        b.add_listener(|_, _| Err(ShopError::Invalid("bang".into())));

        let mut log = Vec::new();
        let err = b.broadcast(&mut log, &()).unwrap_err();

        assert_eq!(log, vec!["first", "second"]);
        match err {
            ShopError::Broadcast { event, failures } => {
                assert_eq!(event, "vehicle registered");
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn empty_broadcaster_is_a_no_op() {
        let mut s: Signal<()> = Signal::new("nothing");
        assert!(s.is_empty());
        s.emit(&mut ()).unwrap();
    }
}
