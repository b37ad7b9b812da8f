//! # Streams
//!
//! Lazy, chainable wrappers around a subscribe function.
//!
//! Each operator returns a new stream that wraps its upstream; nothing runs
//! until [`Stream::subscribe`] is called, and subscribing returns the
//! upstream source's own [`Subscription`].
//!
//! ```rust,ignore
//! let titles = editor
//!     .on::<BlockInsertEvent>()
//!     .filter(|e| e.target_id == "root")
//!     .map(|e| e.block_id.clone());
//!
//! let sub = titles.subscribe(|id| println!("inserted {id}"));
//! sub.unsubscribe();
//! ```

use std::rc::Rc;

use crate::event_bus::Subscription;

/// Downstream receiver of stream values
pub type Sink<T> = Rc<dyn Fn(&T)>;

type Source<T> = Rc<dyn Fn(Sink<T>) -> Subscription>;

pub struct Stream<T: 'static> {
    source: Source<T>,
}

impl<T: 'static> Stream<T> {
    pub fn new(source: impl Fn(Sink<T>) -> Subscription + 'static) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    /// Drop values failing `predicate`; nothing downstream sees them.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let upstream = Rc::clone(&self.source);
        let predicate = Rc::new(predicate);

        Stream::new(move |sink: Sink<T>| {
            let predicate = Rc::clone(&predicate);
            upstream(Rc::new(move |value: &T| {
                if predicate(value) {
                    sink(value);
                }
            }))
        })
    }

    pub fn map<U: 'static>(&self, transform: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let upstream = Rc::clone(&self.source);
        let transform = Rc::new(transform);

        Stream::new(move |sink: Sink<U>| {
            let transform = Rc::clone(&transform);
            upstream(Rc::new(move |value: &T| sink(&transform(value))))
        })
    }

    /// Run a side effect and pass the value through unchanged.
    pub fn tap(&self, effect: impl Fn(&T) + 'static) -> Stream<T> {
        let upstream = Rc::clone(&self.source);
        let effect = Rc::new(effect);

        Stream::new(move |sink: Sink<T>| {
            let effect = Rc::clone(&effect);
            upstream(Rc::new(move |value: &T| {
                effect(value);
                sink(value);
            }))
        })
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + 'static) -> Subscription {
        (self.source)(Rc::new(handler))
    }
}

impl<T: 'static> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
        }
    }
}

impl<T: 'static> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}
