//! CHIP-8 cartridge.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::core::opcodes;
use crate::core::types::{C8Addr, C8Byte};
use crate::errors::{CResult, Fault};
use crate::peripherals::memory::{MEMORY_SIZE, PROGRAM_START};

/// Cartridge max size.
pub const CARTRIDGE_MAX_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

/// A ROM image: a flat byte sequence, no header, loaded at 0x200.
pub struct Cartridge {
    title: String,
    data: Vec<C8Byte>,
}

impl Cartridge {
    /// Create a cartridge from raw bytes.
    ///
    /// Fails with [`Fault::RomTooLarge`] when the image does not fit in
    /// program memory.
    pub fn from_bytes(title: &str, data: &[C8Byte]) -> Result<Self, Fault> {
        if data.len() > CARTRIDGE_MAX_SIZE {
            return Err(Fault::RomTooLarge(data.len()));
        }

        Ok(Cartridge {
            title: title.to_string(),
            data: data.to_vec(),
        })
    }

    /// Load a cartridge from a file.
    pub fn load_from_path(path: &Path) -> CResult<Self> {
        let mut file = File::open(path)?;

        let mut contents = Vec::with_capacity(CARTRIDGE_MAX_SIZE);
        file.read_to_end(&mut contents)?;

        let title = Cartridge::get_game_name(path);
        tracing::info!("loaded cartridge {:?} ({} bytes)", title, contents.len());

        Ok(Cartridge::from_bytes(&title, &contents)?)
    }

    /// Get game name from a path (the file stem).
    pub fn get_game_name(path: &Path) -> String {
        match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => path.to_string_lossy().into_owned(),
        }
    }

    /// Get cartridge title.
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Get internal data.
    pub fn get_data(&self) -> &[C8Byte] {
        &self.data
    }

    /// Write the cartridge disassembly to a stream.
    ///
    /// Words that decode to no instruction are listed as raw data, since ROMs
    /// freely mix sprites with code. A trailing odd byte is ignored.
    pub fn write_disassembly_to_stream(&self, output: &mut impl Write) -> io::Result<()> {
        let mut ptr = 0;

        while ptr + 1 < self.data.len() {
            let word =
                (C8Addr::from(self.data[ptr]) << 8) | C8Addr::from(self.data[ptr + 1]);
            let addr = PROGRAM_START + ptr as C8Addr;

            match opcodes::decode(word) {
                Some(opcode) => {
                    let (assembly, verbose) = opcodes::get_opcode_str(&opcode);
                    writeln!(output, "{:04X}| ({:04X})  {:<24} ; {}", addr, word, assembly, verbose)?;
                }
                None => {
                    writeln!(output, "{:04X}| ({:04X})  {:<24} ; raw data", addr, word, "DATA")?;
                }
            }

            ptr += 2;
        }

        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_checks_capacity() {
        let oversized = vec![0u8; CARTRIDGE_MAX_SIZE + 1];
        assert_eq!(
            Cartridge::from_bytes("huge", &oversized).err(),
            Some(Fault::RomTooLarge(CARTRIDGE_MAX_SIZE + 1))
        );

        let full = vec![0u8; CARTRIDGE_MAX_SIZE];
        assert!(Cartridge::from_bytes("full", &full).is_ok());
    }

    #[test]
    fn test_disassembly_output() {
        let example: &[C8Byte] = b"\x00\xE0\x63\x00\x01\x23";
        let cartridge = Cartridge::from_bytes("test", example).unwrap();

        let mut raw = Vec::new();
        cartridge.write_disassembly_to_stream(&mut raw).unwrap();
        let text = std::str::from_utf8(&raw).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "0200| (00E0)  CLS                      ; clearing screen"
        );
        assert_eq!(
            lines[1],
            "0202| (6300)  LD V3, 00                ; set V3 = 00"
        );
        assert_eq!(
            lines[2],
            "0204| (0123)  DATA                     ; raw data"
        );
    }

    #[test]
    fn test_game_name() {
        assert_eq!(
            Cartridge::get_game_name(Path::new("TOTO.ch8")),
            String::from("TOTO")
        );
        assert_eq!(
            Cartridge::get_game_name(Path::new("TEST/TOTO.ch8")),
            String::from("TOTO")
        );
    }
}
