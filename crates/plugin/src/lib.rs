//! Plugin authoring surface for plugin-host
//!
//! Plugins are described by a [`PluginDescriptor`] and opt into lifecycle
//! phases by implementing the capability traits in [`traits`]. Everything a
//! plugin may touch on the hosting application goes through [`Host`].

pub mod descriptor;
pub mod host;
pub mod testing;
pub mod traits;

pub use descriptor::*;
pub use host::*;
pub use traits::*;
