mod store;
mod zones;

pub use store::RemoteRuleStore;
pub use zones::ZoneDirectory;
