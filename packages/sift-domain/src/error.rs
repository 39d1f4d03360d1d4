use std::fmt::{Display, Formatter};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("{label}: enter a whole number of at most 10 digits and try again.")]
	Format { label: String },
	#[error("{label} {bound}.")]
	Range { label: String, bound: Bound },
	#[error("{label}: range is invalid, the lower value exceeds the upper value.")]
	Ordering { label: String },
	#[error("Too few filter criteria: set at least one filter.")]
	EmptyFilter,
	#[error("Invalid field table: {message}")]
	InvalidTable { message: String },
}
impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Format { .. } => ErrorKind::Format,
			Self::Range { .. } => ErrorKind::Range,
			Self::Ordering { .. } => ErrorKind::Ordering,
			Self::EmptyFilter => ErrorKind::EmptyFilter,
			Self::InvalidTable { .. } => ErrorKind::Table,
		}
	}

	pub(crate) fn table(message: impl Into<String>) -> Self {
		Self::InvalidTable { message: message.into() }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Format,
	Range,
	Ordering,
	EmptyFilter,
	Table,
}

/// The limit a value crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
	Min(u64),
	Max(u64),
}
impl Display for Bound {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Min(min) => write!(f, "must be at least {min}"),
			Self::Max(max) => write!(f, "must be at most {max}"),
		}
	}
}
