pub mod chembl;
pub mod hetionet;
pub mod mapping;
pub mod sider;
pub mod unichem;
