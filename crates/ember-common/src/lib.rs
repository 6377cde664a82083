// ember-common — engine support library shared by the client:
// logging, filesystem helpers, compression, crash reporting, and
// system-information probing.

pub mod compression;
pub mod crash;
pub mod files;
pub mod logger;
pub mod sysinfo;
