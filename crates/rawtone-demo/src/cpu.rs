//! Host capability detection. Runs once at startup; the core only consumes the flags.

use rawtone_core::CpuFlags;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn detect() -> CpuFlags {
    CpuFlags {
        sse2: is_x86_feature_detected!("sse2"),
        avx2: is_x86_feature_detected!("avx2"),
    }
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
pub fn detect() -> CpuFlags {
    CpuFlags::NONE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_x86_64_always_has_sse2() {
        assert!(detect().sse2);
    }

    #[test]
    fn test_avx2_implies_sse2() {
        let flags = detect();
        assert!(!flags.avx2 || flags.sse2);
    }
}
