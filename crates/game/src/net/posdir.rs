use crate::map::{Direction, MAX_COORD, Position};

/// STATE value meaning "this rat has no missile in flight".
pub const NO_MISSILE: u32 = 0xffff_ffff;

const COORD_BITS: u32 = 15;
const DIR_SHIFT: u32 = 2 * COORD_BITS;

/// Packs a cell and heading into one wire word.
///
/// ```text
///  bit 0        14 15        29 30   31
///     +-----------+------------+-------+
///     |     x     |     y      |  dir  |
///     +-----------+------------+-------+
/// ```
///
/// This is protocol version 1; the older dir-in-low-bits layout is not
/// understood.
#[inline]
pub fn pack_posdir(pos: Position, dir: Direction) -> u32 {
    (pos.x as u32 & MAX_COORD as u32)
        | ((pos.y as u32 & MAX_COORD as u32) << COORD_BITS)
        | ((dir.bits() as u32 & 0b11) << DIR_SHIFT)
}

#[inline]
pub fn unpack_posdir(posdir: u32) -> (Position, Direction) {
    let x = (posdir & MAX_COORD as u32) as u16;
    let y = ((posdir >> COORD_BITS) & MAX_COORD as u32) as u16;
    let dir = match Direction::from_bits(((posdir >> DIR_SHIFT) & 0b11) as u8) {
        Some(dir) => dir,
        None => unreachable!("two-bit direction field out of range"),
    };
    (Position::new(x, y), dir)
}

pub fn pack_missile(missile: Option<(Position, Direction)>) -> u32 {
    match missile {
        Some((pos, dir)) => pack_posdir(pos, dir),
        None => NO_MISSILE,
    }
}

pub fn unpack_missile(posdir: u32) -> Option<(Position, Direction)> {
    if posdir == NO_MISSILE {
        None
    } else {
        Some(unpack_posdir(posdir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posdir_round_trip() {
        let samples = [0u16, 1, 2, 17, 255, 256, 1024, 0x4000, MAX_COORD - 1];
        for &x in &samples {
            for &y in &samples {
                for dir in Direction::ALL {
                    let pos = Position::new(x, y);
                    assert_eq!(unpack_posdir(pack_posdir(pos, dir)), (pos, dir));
                }
            }
        }
    }

    #[test]
    fn posdir_bit_layout() {
        let word = pack_posdir(Position::new(5, 9), Direction::East);
        assert_eq!(word & 0x7fff, 5);
        assert_eq!((word >> 15) & 0x7fff, 9);
        assert_eq!(word >> 30, 2);
    }

    #[test]
    fn missing_missile_uses_sentinel() {
        assert_eq!(pack_missile(None), NO_MISSILE);
        assert_eq!(unpack_missile(NO_MISSILE), None);

        let missile = Some((Position::new(3, 1), Direction::West));
        assert_eq!(unpack_missile(pack_missile(missile)), missile);
    }
}
