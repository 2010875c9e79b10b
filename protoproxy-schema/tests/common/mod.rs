use protoproxy_schema::DescriptorBridge;
use protoproxy_schema::fixtures;

pub fn bridge() -> DescriptorBridge {
    fixtures::bridge().unwrap()
}
