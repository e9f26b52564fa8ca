/// Pool-Share Market Maker
///
/// The price of a side is that side's share of all stake placed so far:
///
///   yes_price = total_yes / (total_yes + total_no)
///   no_price  = total_no  / (total_yes + total_no)
///
/// Unlike a bonding curve, the final price depends only on the totals, not
/// on the order the stakes arrived in. With nothing staked both sides sit at
/// the uninformative 0.5.
///
/// Settlement splits the pool (both sides) among the winners in proportion
/// to their stake after the house fee, flooring each payout.

/// Minimum stake accepted for a single bet
pub const MIN_BET_AMOUNT: f64 = 0.001;

/// Price of both sides before any stake is placed
pub const UNINFORMED_PRICE: f64 = 0.5;

/// Flat house fee taken from the pool before distribution (5%)
pub const HOUSE_FEE_RATE: f64 = 0.05;

/// Fraction of the pool distributed to winners
pub const PAYOUT_RATE: f64 = 0.95;

/// (yes_price, no_price) for the given stake totals
pub fn prices(total_yes: f64, total_no: f64) -> (f64, f64) {
    let total = total_yes + total_no;
    if total <= 0.0 {
        return (UNINFORMED_PRICE, UNINFORMED_PRICE);
    }
    (total_yes / total, total_no / total)
}

/// Payout for one winning stake. Caller guarantees `winning_stake > 0`.
pub fn payout(amount: f64, winning_stake: f64, pool: f64) -> f64 {
    let share = amount / winning_stake;
    (share * pool * PAYOUT_RATE).floor()
}
