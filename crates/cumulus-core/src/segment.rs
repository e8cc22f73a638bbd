//! Segmentation of oversized files and content digests.

use eyre::{Context, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::naming::{digit_width, segment_name};

/// One bounded slice of a file, destined for its own remote object.
#[derive(Debug, Clone)]
pub struct Segment {
    /// 1-based position within the plan.
    pub index: u64,
    /// Byte offset of the slice within the source file.
    pub offset: u64,
    /// Slice length in bytes.
    pub len: u64,
    /// Remote object name for this slice.
    pub name: String,
}

/// Ordered upload plan for one file. Concatenating the segments in index
/// order reconstructs the file exactly; segment sizes sum to `file_size`.
#[derive(Debug, Clone)]
pub struct SegmentPlan {
    pub file_size: u64,
    pub segment_size: u64,
    /// False for files under the ceiling: one whole-file segment under the
    /// bare object name and no manifest.
    pub split: bool,
    pub segments: Vec<Segment>,
}

impl SegmentPlan {
    /// Plan the upload of a `file_size`-byte file as `object`. Files under
    /// `ceiling` bytes (including empty files) stay whole.
    pub fn new(object: &str, file_size: u64, ceiling: u64) -> Self {
        let ceiling = ceiling.max(1);
        if file_size < ceiling {
            return Self {
                file_size,
                segment_size: ceiling,
                split: false,
                segments: vec![Segment {
                    index: 1,
                    offset: 0,
                    len: file_size,
                    name: object.to_string(),
                }],
            };
        }

        let count = file_size.div_ceil(ceiling);
        let width = digit_width(count);
        let segments = (1..=count)
            .map(|index| {
                let offset = (index - 1) * ceiling;
                Segment {
                    index,
                    offset,
                    len: (file_size - offset).min(ceiling),
                    name: segment_name(object, index, width),
                }
            })
            .collect();

        Self {
            file_size,
            segment_size: ceiling,
            split: true,
            segments,
        }
    }

    pub fn segment_count(&self) -> u64 {
        self.segments.len() as u64
    }
}

const DIGEST_BUF: usize = 256 * 1024;

/// Copy up to `limit` bytes from `src` into `dst`, digesting as it goes.
/// Returns the bytes copied and their MD5 hex digest.
pub fn copy_and_digest(
    src: &mut dyn Read,
    dst: &mut dyn Write,
    limit: u64,
) -> Result<(u64, String)> {
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; DIGEST_BUF];
    let mut copied = 0u64;

    while copied < limit {
        let want = ((limit - copied) as usize).min(buf.len());
        let n = src.read(&mut buf[..want]).context("read segment bytes")?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
        dst.write_all(&buf[..n]).context("spool segment bytes")?;
        copied += n as u64;
    }

    Ok((copied, format!("{:x}", ctx.finalize())))
}

/// MD5 hex digest of a whole file, streamed.
pub fn file_md5(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut ctx = md5::Context::new();
    let mut buf = vec![0u8; DIGEST_BUF];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        ctx.consume(&buf[..n]);
    }
    Ok(format!("{:x}", ctx.finalize()))
}
