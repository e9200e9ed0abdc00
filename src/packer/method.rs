// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::str::FromStr;

use strum::IntoEnumIterator as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ContainerKind {
    Zip,
    Tar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Compression {
    None,
    /// zlib wrapped deflate stream
    Deflate,
    Gzip,
    Bzip2,
    Xz,
    /// legacy `.lzma` stream
    Lzma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Threading {
    Single,
    Multi,
}

/// Container format and compression of a packed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum PackerMethod {
    ZipUncompressed,
    /// Deflate compressed zip, threading decided by configuration.
    ZipDeflate,
    ZipDeflateSingleThreaded,
    ZipDeflateMultiThreaded,
    TarUncompressed,
    TarDeflate,
    TarGzip,
    TarBzip2,
    TarXz,
    TarLzma,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown packer method {0:?}")]
pub struct UnknownPackerMethod(pub String);

impl PackerMethod {
    /// Code clients use to request the method. Concrete zip deflate variants
    /// are only reachable through [`PackerMethod::ZipDeflate`].
    pub fn request_short_code(self) -> Option<&'static str> {
        use PackerMethod::*;
        match self {
            ZipUncompressed => Some("zip/uncompressed"),
            ZipDeflate => Some("zip/deflate"),
            ZipDeflateSingleThreaded | ZipDeflateMultiThreaded => None,
            TarUncompressed => Some("tar"),
            TarDeflate => Some("tar+deflate"),
            TarGzip => Some("tar+gzip"),
            TarBzip2 => Some("tar+bzip2"),
            TarXz => Some("tar+xz"),
            TarLzma => Some("tar+lzma"),
        }
    }

    /// Code identifying the format of a packed result, as sent back to clients.
    pub fn packed_short_code(self) -> &'static str {
        use PackerMethod::*;
        match self {
            ZipUncompressed => "zip/uncompressed",
            ZipDeflate | ZipDeflateSingleThreaded | ZipDeflateMultiThreaded => "zip/deflate",
            TarUncompressed => "tar",
            TarDeflate => "tar+deflate",
            TarGzip => "tar+gzip",
            TarBzip2 => "tar+bzip2",
            TarXz => "tar+xz",
            TarLzma => "tar+lzma",
        }
    }

    pub fn by_request_short_code(code: &str) -> Option<Self> {
        Self::iter().find(|it| it.request_short_code() == Some(code))
    }

    /// Resolves a packed short code to a concrete method, aliases excluded.
    pub fn by_packed_short_code(code: &str) -> Option<Self> {
        Self::iter().find(|it| !it.is_alias() && it.packed_short_code() == code)
    }

    pub fn is_alias(self) -> bool {
        self == PackerMethod::ZipDeflate
    }

    pub fn container(self) -> ContainerKind {
        use PackerMethod::*;
        match self {
            ZipUncompressed | ZipDeflate | ZipDeflateSingleThreaded | ZipDeflateMultiThreaded => {
                ContainerKind::Zip
            }
            TarUncompressed | TarDeflate | TarGzip | TarBzip2 | TarXz | TarLzma => {
                ContainerKind::Tar
            }
        }
    }

    pub fn compression(self) -> Compression {
        use PackerMethod::*;
        match self {
            ZipUncompressed | TarUncompressed => Compression::None,
            ZipDeflate | ZipDeflateSingleThreaded | ZipDeflateMultiThreaded | TarDeflate => {
                Compression::Deflate
            }
            TarGzip => Compression::Gzip,
            TarBzip2 => Compression::Bzip2,
            TarXz => Compression::Xz,
            TarLzma => Compression::Lzma,
        }
    }

    /// [`None`] for aliases, whose threading is a deployment decision.
    pub fn threading(self) -> Option<Threading> {
        match self {
            PackerMethod::ZipDeflate => None,
            PackerMethod::ZipDeflateMultiThreaded => Some(Threading::Multi),
            _ => Some(Threading::Single),
        }
    }

    pub fn is_zip(self) -> bool {
        self.container() == ContainerKind::Zip
    }

    pub fn is_uncompressed(self) -> bool {
        self.compression() == Compression::None
    }

    /// File extension conventionally used for a packed result.
    pub fn file_extension(self) -> &'static str {
        match (self.container(), self.compression()) {
            (ContainerKind::Zip, _) => "zip",
            (ContainerKind::Tar, Compression::None) => "tar",
            (ContainerKind::Tar, Compression::Deflate) => "tar.zz",
            (ContainerKind::Tar, Compression::Gzip) => "tar.gz",
            (ContainerKind::Tar, Compression::Bzip2) => "tar.bz2",
            (ContainerKind::Tar, Compression::Xz) => "tar.xz",
            (ContainerKind::Tar, Compression::Lzma) => "tar.lzma",
        }
    }
}

/// Parses a request short code.
impl FromStr for PackerMethod {
    type Err = UnknownPackerMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_request_short_code(s).ok_or_else(|| UnknownPackerMethod(s.to_owned()))
    }
}
