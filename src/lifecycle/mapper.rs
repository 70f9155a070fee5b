/// Read access to a value that may not be loaded yet.
pub trait LoadableMapper<T> {
    fn lmap<R, F: FnOnce(&T) -> R>(&self, f: F) -> Option<R>;
}
