use rquickjs::CatchResultExt;

use super::error::JsError;

/// Minimal browser environment stubs.
///
/// The embedded signing script probes `window`/`navigator`/`document`
/// on load; these stand-ins are enough for it to run headless.
const BROWSER_ENV_SETUP: &str = r#"
    var window = globalThis;
    var navigator = {
        userAgent: 'Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36',
        platform: 'Win32',
        language: 'zh-CN',
        appCodeName: 'Mozilla',
        onLine: true,
        cookieEnabled: true
    };
    window.navigator = navigator;
    window.innerWidth = 1536;
    window.innerHeight = 864;
    window.screen = { width: 1536, height: 864 };
    window.addEventListener = function() {};
    window.sessionStorage = {};
    window.localStorage = {};
    var document = { cookie: '', hidden: true, referrer: '' };
    window.document = document;
"#;

/// A wrapper around `rquickjs::Context` with a string-oriented API.
pub struct JsContext {
    ctx: rquickjs::Context,
}

impl JsContext {
    pub fn new(runtime: &rquickjs::Runtime) -> Result<Self, JsError> {
        let ctx = rquickjs::Context::full(runtime)
            .map_err(|e| JsError::ContextCreation(e.to_string()))?;
        Ok(Self { ctx })
    }

    /// Install the browser stubs, optionally overriding the user agent.
    pub fn setup_browser_env(&self, user_agent: Option<&str>) -> Result<(), JsError> {
        match user_agent {
            Some(ua) => {
                let code = BROWSER_ENV_SETUP.replace(
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
                    ua,
                );
                self.eval_void(&code)
            }
            None => self.eval_void(BROWSER_ENV_SETUP),
        }
    }

    /// Load a script into the context, discarding its value.
    pub fn load_script(&self, script: &str) -> Result<(), JsError> {
        self.eval_void(script)
    }

    /// Evaluate and coerce the result to a String.
    pub fn eval_string(&self, code: &str) -> Result<String, JsError> {
        self.ctx.with(|ctx| {
            let result: Result<String, _> = ctx.eval(code);
            result.catch(&ctx).map_err(Self::convert_caught_error)
        })
    }

    fn eval_void(&self, code: &str) -> Result<(), JsError> {
        self.ctx.with(|ctx| {
            let result: Result<(), _> = ctx.eval(code);
            result.catch(&ctx).map_err(Self::convert_caught_error)
        })
    }

    fn convert_caught_error(caught: rquickjs::CaughtError) -> JsError {
        use rquickjs::CaughtError;
        match caught {
            CaughtError::Exception(exc) => {
                let msg = exc.message().unwrap_or_default();
                match exc.stack() {
                    Some(stack) if !stack.is_empty() => JsError::eval_with_stack(msg, stack),
                    _ => JsError::eval(msg),
                }
            }
            CaughtError::Value(val) => JsError::eval(format!(
                "JS threw value: {:?}",
                val.as_string().map(|s| s.to_string())
            )),
            CaughtError::Error(err) => JsError::eval(err.to_string()),
        }
    }
}
