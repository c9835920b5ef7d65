pub mod decode;
pub mod encode;
pub mod staging;
pub mod wav;

pub use decode::decode_file;
pub use encode::{encoder_for, AudioEncoder, FfmpegMp3Encoder, WavEncoder};
pub use staging::{stage, StagedFile};
pub use wav::{read_wav, write_wav};
