use std::cell::RefCell;

use super::context::JsContext;
use super::error::JsError;

// QuickJS runtimes are not Send (Rc internally), so each thread caches
// its own. Repeated signings on the same worker thread reuse the runtime
// instead of paying runtime construction per call.
thread_local! {
    static THREAD_RUNTIME: RefCell<Option<rquickjs::Runtime>> = const { RefCell::new(None) };
}

/// Stateless handle over the thread-local QuickJS runtime.
///
/// Contexts are created fresh per `execute` call, so concurrent requests
/// on different threads never share mutable script state.
pub struct JsEngineManager;

impl JsEngineManager {
    pub fn global() -> Self {
        Self
    }

    fn with_runtime<F, T>(f: F) -> Result<T, JsError>
    where
        F: FnOnce(&rquickjs::Runtime) -> Result<T, JsError>,
    {
        THREAD_RUNTIME.with(|cell| {
            let mut runtime_ref = cell.borrow_mut();

            if runtime_ref.is_none() {
                let runtime = rquickjs::Runtime::new()
                    .map_err(|e| JsError::RuntimeCreation(e.to_string()))?;
                *runtime_ref = Some(runtime);
            }

            match runtime_ref.as_ref() {
                Some(runtime) => f(runtime),
                None => Err(JsError::RuntimeCreation("runtime cache empty".to_string())),
            }
        })
    }

    /// Run `f` against a fresh context on this thread's runtime.
    pub fn execute<F, T>(&self, f: F) -> Result<T, JsError>
    where
        F: FnOnce(&JsContext) -> Result<T, JsError>,
    {
        Self::with_runtime(|runtime| {
            let ctx = JsContext::new(runtime)?;
            f(&ctx)
        })
    }

    #[allow(dead_code)]
    pub fn clear_cache() {
        THREAD_RUNTIME.with(|cell| {
            *cell.borrow_mut() = None;
        });
    }
}

impl Default for JsEngineManager {
    fn default() -> Self {
        Self::global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_execution() {
        let result = JsEngineManager::global().execute(|ctx| ctx.eval_string("String(1 + 2)"));
        assert_eq!(result.unwrap(), "3");
    }

    #[test]
    fn runtime_is_reused_within_thread() {
        let manager = JsEngineManager::global();
        assert!(manager.execute(|ctx| ctx.eval_string("'a'")).is_ok());
        assert!(manager.execute(|ctx| ctx.eval_string("'b'")).is_ok());
    }

    #[test]
    fn browser_env_provides_window() {
        let result = JsEngineManager::global().execute(|ctx| {
            ctx.setup_browser_env(None)?;
            ctx.eval_string("typeof window.navigator.userAgent")
        });
        assert_eq!(result.unwrap(), "string");
    }
}
