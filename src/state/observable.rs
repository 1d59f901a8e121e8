use std::sync::Arc;

use tokio::sync::watch;

/// A shared value cell that view-models write and views read.
///
/// Cloning yields another handle to the same cell. Every write wakes the
/// receivers handed out by [`Observable::subscribe`]; readers that only
/// render once per frame can call [`Observable::get`] instead.
#[derive(Debug)]
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Observable<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx: Arc::new(tx) }
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> Observable<T> {
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_cell() {
        let cell = Observable::new(1);
        let other = cell.clone();

        other.set(5);
        assert_eq!(cell.get(), 5);

        cell.update(|v| *v += 1);
        assert_eq!(other.get(), 6);
    }

    #[tokio::test]
    async fn subscribers_see_every_write() {
        let cell = Observable::new(String::new());
        let mut rx = cell.subscribe();

        cell.set("first".to_string());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "first");

        cell.update(|s| s.push_str("+second"));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), "first+second");
    }

    #[test]
    fn writes_without_subscribers_are_kept() {
        let cell: Observable<Option<u8>> = Observable::default();
        cell.set(Some(3));
        assert_eq!(cell.with(|v| v.map(|n| n * 2)), Some(6));
    }
}
