//! Alignment-aware bulk memory copy.
//!
//! Framebuffers are large and the memory bus is narrow, so per-byte copies cost a
//! measurable slice of the frame budget. [`copy`] moves whole words in unrolled
//! bursts when both ends are word-aligned and falls back to half-word stores
//! otherwise. The destination never sees a lone byte store: an odd head or tail
//! byte is merged into its enclosing half-word with a read-modify-write.
//!
//! Neither routine is a general `memmove`; overlapping regions are not supported.

use core::ptr;

/// Words moved per unrolled burst.
const BURST_WORDS: usize = 4;

/// Copies `size` bytes from `src` to `dst`, fastest path first.
///
/// A zero `size` or a null pointer on either side is a no-op.
///
/// # Safety
/// - `src` must be valid for reads of `size` bytes and `dst` for writes of `size` bytes.
/// - The two regions must not overlap.
/// - If `dst` is odd, the byte just before it must be valid for reads and writes; if
///   `dst + size` is odd, so must the byte just after the region. Both bytes are
///   written back unchanged. Any region inside a buffer that starts and ends on a
///   half-word boundary satisfies this, which is how [`Surface`](crate::video::Surface)
///   lays out its storage.
pub unsafe fn copy(dst: *mut u8, src: *const u8, size: usize) {
    if size == 0 || dst.is_null() || src.is_null() {
        return;
    }

    let mut size = size;
    let mut src8 = src;
    let mut dst16: *mut u16;

    if ((src as usize) | (dst as usize)) % 4 == 0 && size >= 4 {
        let words = size >> 2;
        unsafe { copy_words_raw(dst.cast::<u32>(), src.cast::<u32>(), words) };

        size &= 3;
        if size == 0 {
            return;
        }
        let done = words << 2;
        src8 = unsafe { src.add(done) };
        dst16 = unsafe { dst.add(done) }.cast::<u16>();
    } else {
        let dst_ofs = (dst as usize) & 1;
        dst16 = unsafe { dst.sub(dst_ofs) }.cast::<u16>();

        // Head: the first byte lands in the upper lane of the half-word before it.
        if dst_ofs != 0 {
            unsafe {
                merge_byte(dst16, 1, *src8);
                src8 = src8.add(1);
                dst16 = dst16.add(1);
            }
            size -= 1;
            if size == 0 {
                return;
            }
        }
    }

    // Source alignment is unknown here, so read it byte-wise and store half-words.
    for _ in 0..size >> 1 {
        unsafe {
            ptr::write(dst16, u16::from_ne_bytes([*src8, *src8.add(1)]));
            src8 = src8.add(2);
            dst16 = dst16.add(1);
        }
    }

    if size & 1 != 0 {
        unsafe { merge_byte(dst16, 0, *src8) };
    }
}

/// Copies `count` whole words with no alignment or tail handling.
///
/// A zero `count` or a null pointer on either side is a no-op.
///
/// # Safety
/// Both pointers must be 4-byte aligned, valid for `count` words, and the regions
/// must not overlap.
pub unsafe fn copy_words_raw(dst: *mut u32, src: *const u32, count: usize) {
    if count == 0 || dst.is_null() || src.is_null() {
        return;
    }

    let mut dst = dst;
    let mut src = src;

    // Leading remainder first, so the burst loop never needs a bounds check.
    for _ in 0..count % BURST_WORDS {
        unsafe {
            *dst = *src;
            dst = dst.add(1);
            src = src.add(1);
        }
    }

    for _ in 0..count / BURST_WORDS {
        unsafe {
            *dst = *src;
            *dst.add(1) = *src.add(1);
            *dst.add(2) = *src.add(2);
            *dst.add(3) = *src.add(3);
            dst = dst.add(BURST_WORDS);
            src = src.add(BURST_WORDS);
        }
    }
}

/// Copies a whole-word region. The slice types already guarantee word alignment and
/// a size that is a multiple of four bytes.
///
/// # Panics
/// Panics if the slices have different lengths.
pub fn copy_words(dst: &mut [u32], src: &[u32]) {
    assert_eq!(
        dst.len(),
        src.len(),
        "copy_words: destination has {} words, source has {}",
        dst.len(),
        src.len()
    );
    // SAFETY: both slices are valid for `len` words, aligned, and cannot alias
    // because one of them is borrowed mutably.
    unsafe { copy_words_raw(dst.as_mut_ptr(), src.as_ptr(), src.len()) };
}

/// Stores `byte` into `lane` (0 = lower address) of the half-word at `half`,
/// keeping the other lane.
#[inline]
unsafe fn merge_byte(half: *mut u16, lane: usize, byte: u8) {
    let mut bytes = unsafe { ptr::read(half) }.to_ne_bytes();
    bytes[lane] = byte;
    unsafe { ptr::write(half, u16::from_ne_bytes(bytes)) };
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUARD: usize = 8;
    const FILL: u8 = 0xA5;

    fn byte_view(words: &mut [u32]) -> &mut [u8] {
        // SAFETY: u32 storage reinterpreted as bytes covering the same allocation.
        unsafe { core::slice::from_raw_parts_mut(words.as_mut_ptr().cast::<u8>(), words.len() * 4) }
    }

    fn check(src_ofs: usize, dst_ofs: usize, size: usize) {
        let mut src_words = vec![0u32; 300];
        let mut dst_words = vec![u32::from_ne_bytes([FILL; 4]); 300];
        let src = byte_view(&mut src_words);
        for (i, b) in src.iter_mut().enumerate() {
            *b = (i * 7 + 3) as u8;
        }
        let dst = byte_view(&mut dst_words);

        let start = GUARD + dst_ofs;
        unsafe { copy(dst.as_mut_ptr().add(start), src.as_ptr().add(GUARD + src_ofs), size) };

        let expected = &src[GUARD + src_ofs..GUARD + src_ofs + size];
        assert_eq!(
            &dst[start..start + size],
            expected,
            "src_ofs={src_ofs} dst_ofs={dst_ofs} size={size}"
        );
        assert!(
            dst[..start].iter().all(|&b| b == FILL),
            "bytes before the region changed (src_ofs={src_ofs} dst_ofs={dst_ofs} size={size})"
        );
        assert!(
            dst[start + size..].iter().all(|&b| b == FILL),
            "bytes after the region changed (src_ofs={src_ofs} dst_ofs={dst_ofs} size={size})"
        );
    }

    #[test]
    fn copies_every_alignment_combination() {
        for src_ofs in 0..4 {
            for dst_ofs in 0..4 {
                for size in [0, 1, 2, 3, 4, 5, 7, 8, 1024] {
                    check(src_ofs, dst_ofs, size);
                }
            }
        }
    }

    #[test]
    fn null_pointers_are_ignored() {
        let mut dst = [0u8; 4];
        unsafe {
            copy(dst.as_mut_ptr(), ptr::null(), 4);
            copy(ptr::null_mut(), dst.as_ptr(), 4);
            copy_words_raw(ptr::null_mut(), ptr::null(), 4);
        }
        assert_eq!(dst, [0; 4]);
    }

    #[test]
    fn word_copy_handles_partial_bursts() {
        for len in 0..11 {
            let src: Vec<u32> = (0..len as u32).map(|v| v.wrapping_mul(0x0101_0101)).collect();
            let mut dst = vec![0xDEAD_BEEF; len];
            copy_words(&mut dst, &src);
            assert_eq!(dst, src);
        }
    }

    #[test]
    #[should_panic(expected = "copy_words")]
    fn word_copy_rejects_length_mismatch() {
        let mut dst = [0u32; 3];
        copy_words(&mut dst, &[1, 2]);
    }
}
