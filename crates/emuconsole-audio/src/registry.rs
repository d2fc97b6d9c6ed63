use crate::error::AudioError;

/// A named constructor for one implementation of `T`.
///
/// `C` is whatever context the constructor needs (nothing for resamplers, the
/// sink configuration for audio backends). Releasing the object is dropping
/// the returned box.
pub struct Factory<T: ?Sized, C: ?Sized = ()> {
    pub name: &'static str,
    pub init: fn(&C) -> Result<Box<T>, AudioError>,
}

impl<T: ?Sized, C: ?Sized> Factory<T, C> {
    pub fn create(&self, ctx: &C) -> Result<Box<T>, AudioError> {
        (self.init)(ctx)
    }
}

/// First factory whose name matches `name` exactly.
pub fn lookup<'a, T: ?Sized, C: ?Sized>(
    factories: &'a [Factory<T, C>],
    name: &str,
) -> Option<&'a Factory<T, C>> {
    factories.iter().find(|f| f.name == name)
}

/// Names of every factory in registration order.
pub fn names<T: ?Sized, C: ?Sized>(factories: &[Factory<T, C>]) -> Vec<&'static str> {
    factories.iter().map(|f| f.name).collect()
}
