mod init;
mod profile;

pub use init::cmd_init;
pub use profile::{cmd_profile_list, cmd_profile_show};
