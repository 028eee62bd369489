use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use super::LoadedModel;
use crate::error::AssetLoadError;

pub type LoadResult = Result<LoadedModel, AssetLoadError>;

/// Single-threaded executor for asset loads.
///
/// Each request carries a caller-defined ticket. Completed loads land in an
/// inbox in completion order, which may differ from request order; the host
/// drains it with [`LoadQueue::poll`] once per frame.
pub struct LoadQueue<T> {
    pool: LocalPool,
    spawner: LocalSpawner,
    inbox: Rc<RefCell<Vec<(T, LoadResult)>>>,
    in_flight: Rc<Cell<usize>>,
}

impl<T: 'static> LoadQueue<T> {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool,
            spawner,
            inbox: Rc::new(RefCell::new(Vec::new())),
            in_flight: Rc::new(Cell::new(0)),
        }
    }

    pub fn request(&mut self, ticket: T, load: LocalBoxFuture<'static, LoadResult>) {
        let inbox = Rc::clone(&self.inbox);
        let in_flight = Rc::clone(&self.in_flight);
        in_flight.set(in_flight.get() + 1);

        let task = async move {
            let result = load.await;
            inbox.borrow_mut().push((ticket, result));
            in_flight.set(in_flight.get().saturating_sub(1));
        };

        if let Err(err) = self.spawner.spawn_local(task) {
            log::error!("Failed to spawn asset load: {}", err);
            self.in_flight.set(self.in_flight.get().saturating_sub(1));
        }
    }

    /// Runs every load that can make progress and returns what finished
    pub fn poll(&mut self) -> Vec<(T, LoadResult)> {
        self.pool.run_until_stalled();
        std::mem::take(&mut *self.inbox.borrow_mut())
    }

    /// Loads requested but not yet delivered by `poll`
    pub fn in_flight(&self) -> usize {
        self.in_flight.get() + self.inbox.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }
}

impl<T: 'static> Default for LoadQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
