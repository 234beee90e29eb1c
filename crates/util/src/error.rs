use thiserror::Error;

/// Error produced by [`BinDecode`](crate::binary::BinDecode) implementations.
///
/// `Incomplete` means the buffer ran out before the value was fully read,
/// which callers may treat as retryable (wait for more bytes, or surface a
/// truncation error with the current offset). `Failure` is unrecoverable.
#[derive(Error, Debug)]
pub enum BinDecodeError {
  #[error("{context}not enough data")]
  Incomplete { context: ContextStack },
  #[error("{context}{message}")]
  Failure {
    message: String,
    context: ContextStack,
  },
}

impl BinDecodeError {
  #[inline]
  pub fn incomplete() -> Self {
    BinDecodeError::Incomplete {
      context: ContextStack::default(),
    }
  }

  #[inline]
  pub fn failure<T>(msg: T) -> Self
  where
    T: std::fmt::Display,
  {
    BinDecodeError::Failure {
      message: msg.to_string(),
      context: ContextStack::default(),
    }
  }

  /// Pushes a context frame, innermost first.
  pub fn context<T: std::fmt::Display>(mut self, ctx: T) -> Self {
    match self {
      BinDecodeError::Incomplete { ref mut context }
      | BinDecodeError::Failure {
        ref mut context, ..
      } => context.0.push(ctx.to_string()),
    }
    self
  }

  #[inline]
  pub fn is_incomplete(&self) -> bool {
    matches!(*self, BinDecodeError::Incomplete { .. })
  }
}

#[derive(Debug, Default)]
pub struct ContextStack(Vec<String>);

impl std::fmt::Display for ContextStack {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.0.iter().rev() {
      write!(f, "{}: ", ctx)?
    }
    Ok(())
  }
}
