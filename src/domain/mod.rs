//! Domain values - pure version rules independent of git operations

pub mod branch;
pub mod bump;
pub mod prerelease;
pub mod semver;
pub mod tag;

pub use branch::{BranchContext, BranchKind};
pub use bump::BumpType;
pub use prerelease::PreReleaseType;
pub use semver::SemVer;
pub use tag::{ParsedTag, TagParser, TagScope};
