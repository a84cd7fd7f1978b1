/// Fixed 256-entry color table for the heat map.
///
/// Index 0 is the hot end. Hue tracks the index while brightness falls
/// off toward the cold end, so quiet bins fade to black instead of
/// wrapping back around to red.
pub struct Palette {
    table: [[u8; 3]; 256],
}

impl Palette {
    pub fn heat() -> Self {
        let mut table = [[0u8; 3]; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = hsv_to_rgb(i as u8, 255, 255 - i as u8);
        }
        Palette { table }
    }

    #[inline]
    pub fn color(&self, index: u8) -> [u8; 3] {
        self.table[index as usize]
    }
}

/// Integer HSV to RGB with all channels in 0..=255.
fn hsv_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    if s == 0 {
        return [v, v, v];
    }

    let region = h / 43;
    let remainder = (h as u32 - region as u32 * 43) * 6;
    let v32 = v as u32;
    let s32 = s as u32;
    let p = ((v32 * (255 - s32)) >> 8) as u8;
    let q = ((v32 * (255 - ((s32 * remainder) >> 8))) >> 8) as u8;
    let t = ((v32 * (255 - ((s32 * (255 - remainder)) >> 8))) >> 8) as u8;

    match region {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}
