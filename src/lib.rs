pub use harrier_core::*;

pub mod cache {
    pub use harrier_cache::*;
}

pub mod vfs {
    pub use harrier_vfs::*;
}

#[cfg(feature = "fs")]
pub mod fs {
    pub use harrier_fs::*;
}

#[cfg(feature = "opendal")]
pub mod opendal {
    pub use harrier_opendal::*;
}

#[cfg(feature = "github")]
pub mod github {
    pub use harrier_github::*;
}

#[cfg(feature = "mem")]
pub mod mem {
    pub use harrier_mem::*;
}

pub mod prelude {
    pub use harrier_core::prelude::*;

    pub use harrier_cache::{CacheClient, CacheOptions};
    pub use harrier_vfs::config::Config;
    pub use harrier_vfs::overlay::{AssetFs, PurgePolicy};
    pub use harrier_vfs::version::VersionService;

    #[cfg(feature = "fs")]
    pub use harrier_fs::LocalStore;

    #[cfg(feature = "opendal")]
    pub use harrier_opendal::RemoteStore;

    #[cfg(feature = "github")]
    pub use harrier_github::{GamedataRepo, GithubStore};

    #[cfg(feature = "mem")]
    pub use harrier_mem::MemStore;
}
