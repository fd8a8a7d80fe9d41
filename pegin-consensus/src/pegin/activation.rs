use pegin_chain::block;

use crate::Config;

/// Returns true if peg-in subsidies are required at `height`.
///
/// Block connection passes the height of the block being connected, and the
/// mempool passes the current tip height.
pub fn is_subsidy_active(height: block::Height, config: &Config) -> bool {
    height >= config.pegin_subsidy_height
}
