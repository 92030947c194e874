//! Supported AWS regions

/// Per-region defaults used by bootstrap and instance injection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: &'static str,
    pub availability_zone: &'static str,
    pub ami: &'static str,
}

pub const REGIONS: &[RegionInfo] = &[
    RegionInfo { name: "ap-northeast-1", availability_zone: "ap-northeast-1b", ami: "ami-9e5cff9e" },
    RegionInfo { name: "ap-southeast-1", availability_zone: "ap-southeast-1b", ami: "ami-ec7879be" },
    RegionInfo { name: "ap-southeast-2", availability_zone: "ap-southeast-2b", ami: "ami-2fce8b15" },
    RegionInfo { name: "eu-central-1", availability_zone: "eu-central-1b", ami: "ami-60f9c27d" },
    RegionInfo { name: "eu-west-1", availability_zone: "eu-west-1b", ami: "ami-7c4b0a0b" },
    RegionInfo { name: "sa-east-1", availability_zone: "sa-east-1b", ami: "ami-cd9518d0" },
    RegionInfo { name: "us-east-1", availability_zone: "us-east-1b", ami: "ami-cf35f3a4" },
    RegionInfo { name: "us-west-1", availability_zone: "us-west-1b", ami: "ami-b33dccf7" },
    RegionInfo { name: "us-west-2", availability_zone: "us-west-2b", ami: "ami-8d5b5dbd" },
];

pub fn lookup(region: &str) -> Option<&'static RegionInfo> {
    REGIONS.iter().find(|r| r.name == region)
}
