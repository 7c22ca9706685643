use std::path::Path;

#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub base: u32,
    pub bytes: Vec<u8>,
    pub perms: &'static str, // e.g., "r-x"
    pub kind: &'static str,  // e.g., "raw"
}

impl Segment {
    pub fn end(&self) -> u32 {
        self.base.wrapping_add(self.bytes.len() as u32)
    }

    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr < self.end()
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub segments: Vec<Segment>,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("cannot read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("--skip {skip} exceeds file size {size}")]
    SkipPastEnd { skip: usize, size: usize },
    #[error("--len {len} exceeds the {remaining} bytes left after --skip")]
    LenPastEnd { len: usize, remaining: usize },
}

pub fn load_raw_bin(path: &Path, base: u32, skip: usize, len: Option<usize>) -> Result<Image, LoadError> {
    let file = std::fs::read(path)?;
    if skip > file.len() {
        return Err(LoadError::SkipPastEnd { skip, size: file.len() });
    }
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        if lim > payload.len() {
            return Err(LoadError::LenPastEnd { len: lim, remaining: payload.len() });
        }
        payload = &payload[..lim];
    }
    let seg = Segment { name: "segment0".into(), base, bytes: payload.to_vec(), perms: "r-x", kind: "raw" };
    Ok(Image { segments: vec![seg] })
}

pub fn read_u8(img: &Image, addr: u32) -> Option<u8> {
    img.segments
        .iter()
        .find(|s| s.contains(addr))
        .map(|s| s.bytes[(addr - s.base) as usize])
}

/// Up to `max` consecutive mapped bytes starting at `addr`.
pub fn read_window(img: &Image, addr: u32, max: usize) -> Vec<u8> {
    (0..max as u32)
        .map_while(|i| read_u8(img, addr.wrapping_add(i)))
        .collect()
}

pub fn is_mapped(img: &Image, addr: u32) -> bool {
    img.segments.iter().any(|s| s.contains(addr))
}
