use std::future::Future;

use crate::error::Error;

/// Long running component with cooperative shutdown.
///
/// `start` runs until the component finishes or `stop` is called from another
/// task, `stop` returns once the component has settled.
pub trait Lifecycle {
    fn start(&self) -> impl Future<Output = Result<(), Error>> + Send;

    fn stop(&self) -> impl Future<Output = ()> + Send;
}
