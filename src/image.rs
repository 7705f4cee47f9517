//! The sparse, block-aligned byte image that backs a codeplug.
//!
//! A real codeplug is roughly 16 MiB of mostly-unused address space, fetched
//! and stored from the radio 16 bytes at a time. Rather than modelling a
//! flat buffer, [`SparseImage`] tracks only the address ranges the codec
//! actually allocates, each aligned to the transport's 16-byte block size.

use std::collections::BTreeMap;

use crate::error::CodecError;

/// The transport's block size; every allocation is rounded to this quantum.
pub const BLOCK_SIZE: u32 = 16;

fn align_down(addr: u32) -> u32 {
    addr - (addr % BLOCK_SIZE)
}

fn align_up_len(addr: u32, len: u32) -> u32 {
    let end = addr + len;
    let aligned_end = end + ((BLOCK_SIZE - (end % BLOCK_SIZE)) % BLOCK_SIZE);
    aligned_end - align_down(addr)
}

struct Region {
    fill: u8,
    bytes: Vec<u8>,
}

/// A sparse, growable collection of byte ranges keyed by their start
/// address, each with a single declared fill byte used both to initialise
/// unwritten bytes and to pad out-of-band allocations.
#[derive(Default)]
pub struct SparseImage {
    regions: BTreeMap<u32, Region>,
}

impl SparseImage {
    pub fn new() -> Self {
        SparseImage {
            regions: BTreeMap::new(),
        }
    }

    /// Ensure `[addr, addr+len)` exists, filled with `fill` where not
    /// already present. Aligns to [`BLOCK_SIZE`]. Idempotent: calling this
    /// again with the same `fill` is a no-op; calling it with a different
    /// `fill` over an existing range is an error, since that would silently
    /// discard the caller's expectation about default bytes.
    pub fn allocate(&mut self, addr: u32, len: u32, fill: u8) -> Result<(), CodecError> {
        if len == 0 {
            return Ok(());
        }
        let base = align_down(addr);
        let total = align_up_len(addr, len);

        if let Some(region) = self.regions.get(&base) {
            if region.bytes.len() as u32 >= total {
                if region.fill != fill {
                    return Err(CodecError::ConflictingAllocation {
                        address: addr,
                        len: len as usize,
                    });
                }
                return Ok(());
            }
        }

        let region = self
            .regions
            .entry(base)
            .or_insert_with(|| Region {
                fill,
                bytes: Vec::new(),
            });
        if region.fill != fill {
            return Err(CodecError::ConflictingAllocation {
                address: addr,
                len: len as usize,
            });
        }
        if (region.bytes.len() as u32) < total {
            region.bytes.resize(total as usize, fill);
        }
        Ok(())
    }

    /// Read `len` bytes starting at `addr`. Fails if any byte in the range
    /// was never allocated.
    pub fn read(&self, addr: u32, len: u32) -> Result<&[u8], CodecError> {
        let base = align_down(addr);
        let region = self.regions.get(&base).ok_or(CodecError::Unallocated {
            address: addr,
            len: len as usize,
        })?;
        let offset = (addr - base) as usize;
        let end = offset + len as usize;
        region
            .bytes
            .get(offset..end)
            .ok_or(CodecError::Unallocated {
                address: addr,
                len: len as usize,
            })
    }

    /// Write `bytes` starting at `addr`. Fails if any byte in the range was
    /// never allocated.
    pub fn write(&mut self, addr: u32, bytes: &[u8]) -> Result<(), CodecError> {
        let base = align_down(addr);
        let region = self.regions.get_mut(&base).ok_or(CodecError::Unallocated {
            address: addr,
            len: bytes.len(),
        })?;
        let offset = (addr - base) as usize;
        let end = offset + bytes.len();
        let slot = region
            .bytes
            .get_mut(offset..end)
            .ok_or(CodecError::Unallocated {
                address: addr,
                len: bytes.len(),
            })?;
        slot.copy_from_slice(bytes);
        Ok(())
    }

    /// True if every byte in `[addr, addr+len)` has been allocated.
    pub fn is_allocated(&self, addr: u32, len: u32) -> bool {
        self.read(addr, len).is_ok()
    }

    /// Iterate over the allocated regions in ascending address order, for
    /// handing off to a transport. Each item is `(base_address, bytes)`.
    pub fn regions(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.regions.iter().map(|(addr, r)| (*addr, r.bytes.as_slice()))
    }

    /// Construct an image directly from a list of `(address, bytes)` pairs,
    /// as a transport would after downloading selected blocks from a radio.
    /// Each region's fill byte is inferred from its first byte's dominant
    /// neighbor convention (0x00 unless the caller says otherwise) — callers
    /// that need exact fill tracking across re-encoding should allocate
    /// first and then `write`.
    pub fn from_regions(regions: impl IntoIterator<Item = (u32, Vec<u8>)>, default_fill: u8) -> Self {
        let mut image = SparseImage::new();
        for (addr, bytes) in regions {
            let base = align_down(addr);
            let offset = (addr - base) as usize;
            let total = offset + bytes.len();
            let region = image.regions.entry(base).or_insert_with(|| Region {
                fill: default_fill,
                bytes: Vec::new(),
            });
            if region.bytes.len() < total {
                region.bytes.resize(total, default_fill);
            }
            region.bytes[offset..offset + bytes.len()].copy_from_slice(&bytes);
        }
        image
    }
}
