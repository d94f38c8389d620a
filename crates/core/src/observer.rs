/// Receives solver events and optionally returns a control action.
///
/// Each solver defines its own event and action types. Observers are how
/// callers record progress, stream results, or stop a run between steps.
pub trait Observer<E, A> {
    /// Observes a solver event and optionally returns a control action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

/// Blanket implementation for observer closures.
impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// A no-op observer that always returns `None`.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Action {
        Stop,
    }

    struct CountTo {
        limit: usize,
        seen: usize,
    }

    impl Observer<usize, Action> for CountTo {
        fn observe(&mut self, _event: &usize) -> Option<Action> {
            self.seen += 1;
            (self.seen >= self.limit).then_some(Action::Stop)
        }
    }

    fn drive<O: Observer<usize, Action>>(mut observer: O, events: usize) -> usize {
        for event in 0..events {
            if observer.observe(&event).is_some() {
                return event;
            }
        }
        events
    }

    #[test]
    fn closure_observer() {
        let stopped_at = drive(|event: &usize| (*event == 3).then_some(Action::Stop), 10);
        assert_eq!(stopped_at, 3);
    }

    #[test]
    fn unit_observer_never_acts() {
        assert_eq!(drive((), 10), 10);
    }

    #[test]
    fn stateful_observer() {
        let counter = CountTo { limit: 4, seen: 0 };
        assert_eq!(drive(counter, 10), 3);
    }

    #[test]
    fn closure_can_borrow_caller_state() {
        let mut last = None;

        let stopped_at = drive(
            |event: &usize| {
                last = Some(*event);
                None::<Action>
            },
            5,
        );

        assert_eq!(stopped_at, 5);
        assert_eq!(last, Some(4));
    }
}
