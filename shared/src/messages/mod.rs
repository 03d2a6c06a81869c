pub mod error;
pub mod field_change;
pub mod update_decoder;
pub mod update_encoder;

cfg_if! {
    if #[cfg(feature = "zstd_support")] {
        pub mod envelope;
    }
}
