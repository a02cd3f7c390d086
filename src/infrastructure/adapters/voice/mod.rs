//! Voice Adapter - 文件系统音色库

mod fs_voice_library;

pub use fs_voice_library::FsVoiceLibrary;
