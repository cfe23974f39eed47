//! Recovery targets reloaded between attempts

/// A capability that can refresh its own state before a retry
///
/// The executor borrows the target and calls [`reload`](Reloadable::reload)
/// exactly once per retry, before any delay. It never constructs or drops
/// it. The target may be the same object whose operation is retried, so
/// `reload` takes `&self`; implementors keep mutable state behind interior
/// mutability.
///
/// A reload failure is terminal: it is never retried and it replaces the
/// operation failure as the outcome surfaced to the caller.
///
/// # Example
///
/// ```rust
/// use reattempt_core::retry::Reloadable;
/// use std::sync::Mutex;
///
/// struct ApiClient {
///     secret: Mutex<String>,
/// }
///
/// impl Reloadable for ApiClient {
///     fn reload(&self) -> anyhow::Result<()> {
///         *self.secret.lock().unwrap() = std::env::var("API_SECRET")?;
///         Ok(())
///     }
/// }
/// ```
pub trait Reloadable {
    /// Refresh the target's reloadable state
    fn reload(&self) -> anyhow::Result<()>;

    /// Name used when reporting reloads
    fn target_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strip the module path from a fully qualified type name
///
/// Generic arguments are kept as written.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base_end = full.find('<').unwrap_or(full.len());
    match full[..base_end].rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
