tonic::include_proto!("signal_service");

pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/signal_service.bin"));
