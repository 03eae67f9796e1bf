//! Layout and packing for the shared colormap/color-palette lookup texture:
//! a single 256x256 RGBA8 2D image where each row is one named table and
//! each texel within a row is one color.

/// Texture width: texels (colors) per row.
pub const CMAP_WIDTH: u32 = 256;
/// Texture height: total number of rows (colormaps + palettes).
pub const CMAP_HEIGHT: u32 = 256;

/// First row of the 144 builtin colormaps.
pub const CMAP_OFS: u32 = 0;
/// Number of builtin colormap rows.
pub const CMAP_NAT: u32 = 144;
/// First row of the 32 user-definable colormaps.
pub const CMAP_USR_OFS: u32 = CMAP_NAT;
/// Number of user-definable colormap rows.
pub const CMAP_USR: u32 = 32;
/// Row of the first fully custom (caller-registered, no builtin fallback)
/// colormap within the user range.
pub const CMAP_CUSTOM: u32 = 160;

/// Pack `colors` into one full texture row's worth of RGBA8 bytes
/// (`CMAP_WIDTH` texels), left-aligned, zero-padding any texels past
/// `colors.len()`.
pub fn pack_row(colors: &[[u8; 4]]) -> Vec<u8> {
    let mut row = vec![0u8; CMAP_WIDTH as usize * 4];
    for (i, color) in colors.iter().take(CMAP_WIDTH as usize).enumerate() {
        row[i * 4..i * 4 + 4].copy_from_slice(color);
    }
    row
}

/// Unpack one texture row's raw RGBA8 bytes back into per-texel colors.
/// Inverse of [`pack_row`]; `row` must be exactly `CMAP_WIDTH * 4` bytes.
pub fn unpack_row(row: &[u8]) -> Vec<[u8; 4]> {
    row.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_round_trips_the_first_colors() {
        let colors = [[255u8, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]];
        let row = pack_row(&colors);
        assert_eq!(row.len(), CMAP_WIDTH as usize * 4);

        let unpacked = unpack_row(&row);
        assert_eq!(unpacked[0], [255, 0, 0, 255]);
        assert_eq!(unpacked[1], [0, 255, 0, 255]);
        assert_eq!(unpacked[2], [0, 0, 255, 255]);
    }

    #[test]
    fn pack_row_zero_fills_the_remainder() {
        let colors = [[10u8, 20, 30, 40]];
        let row = pack_row(&colors);
        let unpacked = unpack_row(&row);
        assert_eq!(unpacked[0], [10, 20, 30, 40]);
        assert_eq!(unpacked[1], [0, 0, 0, 0]);
        assert_eq!(unpacked[CMAP_WIDTH as usize - 1], [0, 0, 0, 0]);
    }

    #[test]
    fn custom_cmap_row_falls_within_the_user_range() {
        assert!(CMAP_CUSTOM >= CMAP_USR_OFS);
        assert!(CMAP_CUSTOM < CMAP_USR_OFS + CMAP_USR);
    }
}
