use cbmc::mc::ChainMC;
use cbmc::system::alkane::{AlkaneParams, Alkanes};

fn main() {
    let mut mc = ChainMC::<Alkanes>::from_args::<AlkaneParams>();
    mc.run();
}
