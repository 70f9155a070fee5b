use futures_util::future::LocalBoxFuture;

use crate::utils::CCStr;

use super::{error::FetchResult, identity::Identity};

/// A trait for UI components whose content depends on asynchronously fetched data.
///
/// Implementors only provide the extension points; rendering and the fetch lifecycle are
/// driven by the [`Fetcher`](super::fetcher::Fetcher) wrapping them.
///
/// # Examples
///
/// ```ignore
/// use fetch_lifecycle::prelude::*;
///
/// struct UserCard {
///     api: ApiClient,
/// }
///
/// impl Fetchable for UserCard {
///     type Args = UserId;
///     type Id = UserId;
///     type Data = User;
///     type View = Node;
///
///     fn identity(args: &UserId) -> UserId {
///         *args
///     }
///
///     fn fetch(&mut self, id: &UserId) -> LocalBoxFuture<'static, Result<User, CCStr>> {
///         let request = self.api.get_user(*id);
///         async move { request.await.map_err(log_error_ccstr) }.boxed_local()
///     }
///
///     fn placeholder(&self) -> Node {
///         Node::text("Loading...")
///     }
///
///     fn hydrate(&self, user: &User) -> Node {
///         Node::text(&user.name)
///     }
/// }
/// ```
pub trait Fetchable: 'static {
    /// What callers pass to `render` and `prefetch`
    type Args;
    /// Which logical data a call refers to
    type Id: Identity;
    /// The fetched payload
    type Data: 'static;
    /// The rendered output. Clones must refer to the same underlying view, so the fetcher
    /// can keep a handle on what got mounted.
    type View: Clone + 'static;

    /// Maps call arguments to the identity of the data they describe.
    ///
    /// Must be deterministic and free of side effects.
    fn identity(args: &Self::Args) -> Self::Id;

    /// Starts loading the data identified by `id`.
    ///
    /// The returned future is driven by the host [`Scheduler`](crate::host::Scheduler).
    fn fetch(&mut self, id: &Self::Id) -> LocalBoxFuture<'static, Result<Self::Data, CCStr>>;

    /// Builds the view shown until the data is available
    fn placeholder(&self) -> Self::View;

    /// Builds the view from fetched data
    fn hydrate(&self, data: &Self::Data) -> Self::View;

    /// One-time setup before the first fetch of an identity
    fn init(&mut self, _args: &Self::Args) {}

    /// Notified once the data of the current identity is mounted, or when its fetch failed
    fn done(&mut self, _result: &FetchResult) {}
}
