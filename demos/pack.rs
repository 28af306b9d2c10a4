use packed_bitset::{Bitset, BitsetError};

fn main() -> Result<(), BitsetError> {
    let mut bitset = Bitset::new(10);
    bitset.set(&[0, 3, 4, 9])?;

    let packed = bitset.pack();
    println!("{bitset:?} packs into {packed:02x?}");

    let unpacked = Bitset::unpack(&packed)?;
    println!("unpacked back into {unpacked:?}");
    println!("complement {:?}", !&unpacked);
    Ok(())
}
