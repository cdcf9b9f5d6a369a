//! Flash erase/write/read/verify commands

use super::BoxedTarget;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Chunk size for bulk reads; purely a progress-reporting granule
const READ_CHUNK: usize = 1024;

/// Create a standard progress bar style
fn create_progress_bar_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")?
        .progress_chars("#>-"))
}

fn progress_bar(total: u64, msg: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(create_progress_bar_style()?);
    pb.set_message(msg);
    Ok(pb)
}

/// Read file contents into a Vec
fn read_file(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    println!("Read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Geometry of the region covering `addr`, if any
fn desc_at(target: &BoxedTarget, addr: u32) -> Option<rprobe_core::FlashDesc> {
    target
        .flash_regions()
        .iter()
        .find(|r| r.desc().contains_addr(addr))
        .map(|r| *r.desc())
}

/// Erase `[addr, addr+len)`, block by block with progress
pub fn run_erase(
    target: &mut BoxedTarget,
    addr: u32,
    len: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    match desc_at(target, addr) {
        Some(d)
            if len > 0
                && d.contains(addr, len)
                && addr % d.erase_block == 0
                && len % d.erase_block == 0 =>
        {
            let block = d.erase_block;
            let pb = progress_bar(len as u64, "erasing")?;
            let mut a = addr;
            while a < addr + len {
                target.flash_erase(a, block)?;
                pb.inc(block as u64);
                a += block;
            }
            pb.finish();
        }
        // Let the core produce its invalid-range/no-region error
        _ => target.flash_erase(addr, len)?,
    }

    println!("Erased 0x{:X} bytes at 0x{:08X}", len, addr);
    Ok(())
}

/// Write a file to flash, erasing the covering blocks first
pub fn run_write(
    target: &mut BoxedTarget,
    addr: u32,
    input: &Path,
    verify: bool,
    no_erase: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_file(input)?;
    if data.is_empty() {
        println!("Nothing to write");
        return Ok(());
    }

    let desc = desc_at(target, addr).ok_or("destination is not in flash")?;

    if !no_erase {
        let block = desc.erase_block as u64;
        let start = addr - addr % desc.erase_block;
        let end = (addr as u64 + data.len() as u64).div_ceil(block) * block;
        run_erase(target, start, (end - start as u64) as u32)?;
    }

    let pb = progress_bar(data.len() as u64, "writing")?;
    let buf = desc.write_buf as usize;
    let mut dest = addr;
    for chunk in data.chunks(buf) {
        target.flash_write(dest, chunk)?;
        pb.inc(chunk.len() as u64);
        dest += chunk.len() as u32;
    }
    pb.finish();

    if verify {
        verify_range(target, addr, &data)?;
    }

    println!("Wrote {} bytes at 0x{:08X}", data.len(), addr);
    Ok(())
}

/// Read target memory to a file
pub fn run_read(
    target: &mut BoxedTarget,
    addr: u32,
    len: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut data = vec![0u8; len as usize];

    let pb = progress_bar(len as u64, "reading")?;
    for (i, chunk) in data.chunks_mut(READ_CHUNK).enumerate() {
        target.read_mem(addr + (i * READ_CHUNK) as u32, chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish();

    File::create(output)?.write_all(&data)?;
    println!("Read {} bytes to {:?}", len, output);
    Ok(())
}

/// Verify flash contents against a file
pub fn run_verify(
    target: &mut BoxedTarget,
    addr: u32,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_file(input)?;
    verify_range(target, addr, &data)?;
    println!("Verify OK ({} bytes)", data.len());
    Ok(())
}

fn verify_range(
    target: &mut BoxedTarget,
    addr: u32,
    want: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut have = vec![0u8; want.len()];
    target.read_mem(addr, &mut have)?;

    match have.iter().zip(want).position(|(h, w)| h != w) {
        None => Ok(()),
        Some(offset) => Err(format!(
            "verify failed at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
            addr + offset as u32,
            want[offset],
            have[offset]
        )
        .into()),
    }
}
