/*
 * This module provides the tokenizer service used by the worker pool.
 * It defines `TokenCounterOperations` for counting tokens in a string and
 * `TokenCounterProvider` for handing out one counter per worker, so a tokenizer
 * instance is never shared between threads. The production implementation is
 * backed by `tiktoken-rs` with the "cl100k_base" encoding.
 */
use tiktoken_rs::{CoreBPE, cl100k_base};

/// Name of the fixed encoding used by `CoreTikTokenProvider`.
pub const CL100K_BASE: &str = "cl100k_base";

/*
 * Errors raised by the tokenizer service. Initialization covers loading the BPE
 * model, encoding covers a failure while turning text into tokens.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    Initialization { encoding: String, message: String },
    // The tiktoken counter cannot fail to encode; counters that can report this.
    #[cfg_attr(not(test), allow(dead_code))]
    Encoding(String),
}

impl std::fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenizerError::Initialization { encoding, message } => {
                write!(f, "failed to initialize encoding {encoding}: {message}")
            }
            TokenizerError::Encoding(message) => write!(f, "encoding failed: {message}"),
        }
    }
}

impl std::error::Error for TokenizerError {}

pub type Result<T> = std::result::Result<T, TokenizerError>;

/*
 * Defines the contract for a service that can count tokens in a given text string.
 * A counter is owned by a single worker and is therefore only required to be `Send`.
 */
pub trait TokenCounterOperations: Send {
    fn count_tokens(&self, text: &str) -> Result<usize>;
}

/*
 * Hands out token counters. The pool holds one provider behind an `Arc` and every
 * worker asks it for its own counter on its first job.
 */
pub trait TokenCounterProvider: Send + Sync {
    fn create_counter(&self) -> Result<Box<dyn TokenCounterOperations>>;
}

/*
 * A `TokenCounterOperations` implementation wrapping a loaded `cl100k_base` BPE model.
 * This model is the one used by OpenAI's GPT-3.5 and GPT-4 models.
 */
pub struct CoreTikTokenCounter {
    bpe: CoreBPE,
}

impl TokenCounterOperations for CoreTikTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

/*
 * Provider that loads a fresh `cl100k_base` model for each requesting worker.
 * Loading failures are returned as `TokenizerError::Initialization`.
 */
pub struct CoreTikTokenProvider;

impl CoreTikTokenProvider {
    pub fn new() -> Self {
        CoreTikTokenProvider
    }
}

impl Default for CoreTikTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounterProvider for CoreTikTokenProvider {
    fn create_counter(&self) -> Result<Box<dyn TokenCounterOperations>> {
        log::trace!("CoreTikTokenProvider: Loading {CL100K_BASE} BPE model.");
        match cl100k_base() {
            Ok(bpe) => Ok(Box::new(CoreTikTokenCounter { bpe })),
            Err(e) => {
                log::debug!("CoreTikTokenProvider: Failed to load {CL100K_BASE}: {e:?}");
                Err(TokenizerError::Initialization {
                    encoding: CL100K_BASE.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/*
 * Deterministic counter that counts whitespace separated words. Used by the pool
 * tests so expected totals can be written down by hand.
 */
#[cfg(test)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleWhitespaceTokenCounter;

#[cfg(test)]
impl TokenCounterOperations for SimpleWhitespaceTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}

#[cfg(test)]
impl TokenCounterProvider for SimpleWhitespaceTokenCounter {
    fn create_counter(&self) -> Result<Box<dyn TokenCounterOperations>> {
        Ok(Box::new(SimpleWhitespaceTokenCounter))
    }
}
