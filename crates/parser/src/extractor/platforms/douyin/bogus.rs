use rand::RngExt;

use crate::error::ExtractorError;
use crate::js_engine::JsEngineManager;

/// The platform's actual client-side signing script, embedded unmodified.
/// It is opaque and changes with platform releases; updating the asset
/// must not require touching any of the code below.
const A_BOGUS_SCRIPT: &str = include_str!("a_bogus.js");

const ENTRY_POINT: &str = "generate_a_bogus";

const MS_TOKEN_ALPHABET: &[u8] =
    b"ABCDEFGHIGKLMNOPQRSTUVWXYZabcdefghigklmnopqrstuvwxyz0123456789=";
const MS_TOKEN_LEN: usize = 107;

/// Computes the `a_bogus` query parameter by running the embedded
/// obfuscated script in a sandboxed QuickJS context.
///
/// Construction probes the sandbox once; if the evaluator cannot be set
/// up or the script does not expose its entry point, the engine is
/// unusable for the lifetime of this extractor instance and the error is
/// not retried.
pub struct SignatureEngine {
    manager: JsEngineManager,
}

impl SignatureEngine {
    pub fn new() -> Result<Self, ExtractorError> {
        let manager = JsEngineManager::global();

        let probe = manager.execute(|ctx| {
            ctx.setup_browser_env(None)?;
            ctx.load_script(A_BOGUS_SCRIPT)?;
            ctx.eval_string(&format!("typeof {ENTRY_POINT}"))
        })?;

        if probe != "function" {
            return Err(ExtractorError::SignatureEngineUnavailable(format!(
                "embedded signing script does not define `{ENTRY_POINT}`"
            )));
        }

        Ok(Self { manager })
    }

    /// `sign(query, userAgent) -> a_bogus`.
    pub fn sign(&self, query: &str, user_agent: &str) -> Result<String, ExtractorError> {
        // serde_json handles the string escaping for the script call.
        let call = format!(
            "{ENTRY_POINT}({}, {})",
            serde_json::to_string(query)?,
            serde_json::to_string(user_agent)?
        );

        let signature = self.manager.execute(|ctx| {
            ctx.setup_browser_env(Some(user_agent))?;
            ctx.load_script(A_BOGUS_SCRIPT)?;
            ctx.eval_string(&call)
        })?;

        if signature.is_empty() {
            return Err(ExtractorError::SignatureEngineUnavailable(
                "signing script returned an empty signature".to_string(),
            ));
        }

        Ok(signature)
    }
}

/// Random `msToken` request parameter. Shape matters (107 chars from the
/// platform's alphabet), cryptographic strength does not.
pub fn ms_token() -> String {
    let mut rng = rand::rng();
    (0..MS_TOKEN_LEN)
        .map(|_| MS_TOKEN_ALPHABET[rng.random_range(0..MS_TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ms_token_shape() {
        let token = ms_token();
        assert_eq!(token.len(), MS_TOKEN_LEN);
        assert!(token.bytes().all(|b| MS_TOKEN_ALPHABET.contains(&b)));
    }

    #[test]
    fn engine_probe_finds_entry_point() {
        let engine = SignatureEngine::new().unwrap();
        let signature = engine
            .sign("device_platform=webapp&aid=6383", "Mozilla/5.0")
            .unwrap();
        assert!(!signature.is_empty());
    }

    #[test]
    fn signature_is_deterministic_per_input_modulo_time() {
        // Different queries must not collide trivially.
        let engine = SignatureEngine::new().unwrap();
        let a = engine.sign("aweme_id=1", "ua").unwrap();
        let b = engine.sign("aweme_id=2", "ua").unwrap();
        assert_ne!(a, b);
    }
}
