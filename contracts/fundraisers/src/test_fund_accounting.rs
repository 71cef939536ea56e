extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Env, String,
};

use crate::invariants::{assert_ledger_invariants, assert_totals_monotonic, Totals};
use crate::{Error, FundStatus, Fundraisers, FundraisersClient, ProgramInput, ProgramStatus};

struct Fixture {
    env: Env,
    client: FundraisersClient<'static>,
    owner: Address,
    pic: Address,
    token: token::Client<'static>,
    token_admin: token::StellarAssetClient<'static>,
}

impl Fixture {
    fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        let contract_id = env.register(Fundraisers, ());
        let client = FundraisersClient::new(&env, &contract_id);

        let issuer = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(issuer);
        let token = token::Client::new(&env, &sac.address());
        let token_admin = token::StellarAssetClient::new(&env, &sac.address());

        let owner = Address::generate(&env);
        let pic = Address::generate(&env);
        client.init(&owner, &token.address);

        Fixture {
            env,
            client,
            owner,
            pic,
            token,
            token_admin,
        }
    }

    fn create_program(&self, target: i128) -> u64 {
        let input = ProgramInput {
            name: String::from_str(&self.env, "School Books"),
            pic_name: String::from_str(&self.env, "Budi"),
            target,
            desc: String::from_str(&self.env, "Textbooks for the new term"),
            pic: self.pic.clone(),
            category: String::from_str(&self.env, "Education"),
            program_link: String::from_str(&self.env, "https://example.com/books"),
            photo_url: String::from_str(&self.env, "https://example.com/books.jpg"),
        };
        self.client.create_program(&self.owner, &input).id
    }

    /// A donor holding `balance` tokens with `allowance` approved to the ledger.
    fn donor(&self, balance: i128, allowance: i128) -> Address {
        let donor = Address::generate(&self.env);
        if balance > 0 {
            self.token_admin.mint(&donor, &balance);
        }
        if allowance > 0 {
            let expiration = self.env.ledger().sequence() + 1_000;
            self.token
                .approve(&donor, &self.client.address, &allowance, &expiration);
        }
        donor
    }

    fn donate(&self, amount: i128) -> Address {
        let donor = self.donor(amount, amount);
        self.client.send_fund(&donor, &amount);
        donor
    }

    fn text(&self, s: &str) -> String {
        String::from_str(&self.env, s)
    }
}

// ─────────────────────────────────────────────────────────
// Donations
// ─────────────────────────────────────────────────────────

#[test]
fn test_send_fund_pulls_tokens_into_custody() {
    let f = Fixture::new();
    let donor = f.donor(1_500, 1_000);

    f.client.send_fund(&donor, &1_000);

    assert_eq!(f.client.total_managed_fund(), 1_000);
    assert_eq!(f.token.balance(&donor), 500);
    assert_eq!(f.token.balance(&f.client.address), 1_000);
    assert_eq!(f.client.contract_balance(), 1_000);
    assert_eq!(f.token.allowance(&donor, &f.client.address), 0);
}

#[test]
fn test_send_zero_or_negative_fund_fails() {
    let f = Fixture::new();
    let donor = f.donor(1_000, 1_000);

    assert_eq!(f.client.try_send_fund(&donor, &0), Err(Ok(Error::InvalidAmount.into())));
    assert_eq!(f.client.try_send_fund(&donor, &-1), Err(Ok(Error::InvalidAmount.into())));
    assert_eq!(f.client.total_managed_fund(), 0);
}

#[test]
fn test_send_fund_without_allowance_fails() {
    let f = Fixture::new();
    let donor = f.donor(1_000, 0);

    assert!(f.client.try_send_fund(&donor, &500).is_err());
    assert_eq!(f.client.total_managed_fund(), 0);
    assert_eq!(f.token.balance(&donor), 1_000);
}

#[test]
fn test_send_fund_without_balance_fails() {
    let f = Fixture::new();
    let donor = f.donor(100, 500);

    assert!(f.client.try_send_fund(&donor, &500).is_err());
    assert_eq!(f.client.total_managed_fund(), 0);
    assert_eq!(f.token.balance(&f.client.address), 0);
}

#[test]
fn test_send_fund_before_init_fails() {
    let env = Env::default();
    env.mock_all_auths();
    let client = FundraisersClient::new(&env, &env.register(Fundraisers, ()));
    let donor = Address::generate(&env);

    assert_eq!(client.try_send_fund(&donor, &10), Err(Ok(Error::NotInitialized.into())));
}

// ─────────────────────────────────────────────────────────
// Allocation
// ─────────────────────────────────────────────────────────

#[test]
fn test_allocate_fund_scenario() {
    let f = Fixture::new();
    let id = f.create_program(1_000);
    f.donate(1_000);

    f.client.allocate_fund(&f.owner, &id);

    let program = f.client.get_program(&id);
    assert_eq!(program.status, ProgramStatus::Allocated);
    assert_eq!(program.allocated, 1_000);
    assert_eq!(f.client.total_allocated(), 1_000);
    assert_eq!(f.client.remaining_fund_for_allocation(), 0);
    assert_ledger_invariants(&f.client);
}

#[test]
fn test_allocate_with_exact_balance_succeeds() {
    let f = Fixture::new();
    let id = f.create_program(750);
    f.donate(750);

    f.client.allocate_fund(&f.owner, &id);
    assert_eq!(f.client.get_program(&id).allocated, 750);
}

#[test]
fn test_allocate_one_short_fails() {
    let f = Fixture::new();
    let id = f.create_program(750);
    f.donate(749);

    assert_eq!(
        f.client.try_allocate_fund(&f.owner, &id),
        Err(Ok(Error::InsufficientFundToAllocate.into()))
    );
    let program = f.client.get_program(&id);
    assert_eq!(program.status, ProgramStatus::Registered);
    assert_eq!(program.allocated, 0);
    assert_eq!(f.client.total_allocated(), 0);
}

#[test]
fn test_allocate_draws_from_shared_pool() {
    let f = Fixture::new();
    let first = f.create_program(600);
    let second = f.create_program(500);
    f.donate(700);
    f.donate(400);

    f.client.allocate_fund(&f.owner, &first);
    assert_eq!(f.client.remaining_fund_for_allocation(), 500);

    f.client.allocate_fund(&f.owner, &second);
    assert_eq!(f.client.remaining_fund_for_allocation(), 0);
    assert_eq!(f.client.total_allocated(), 1_100);

    // Withdrawals do not return funds to the pool.
    f.client.withdraw_fund(&f.pic, &first, &f.text("rent"), &600);
    assert_eq!(f.client.remaining_fund_for_allocation(), 0);
    assert_ledger_invariants(&f.client);
}

#[test]
fn test_second_allocation_fails() {
    let f = Fixture::new();
    let id = f.create_program(300);
    f.donate(1_000);
    f.client.allocate_fund(&f.owner, &id);

    assert_eq!(
        f.client.try_allocate_fund(&f.owner, &id),
        Err(Ok(Error::ProgramNotRegistered.into()))
    );
    assert_eq!(f.client.get_program(&id).allocated, 300);
    assert_eq!(f.client.total_allocated(), 300);
}

#[test]
fn test_allocate_guards() {
    let f = Fixture::new();
    let id = f.create_program(300);
    f.donate(300);

    assert_eq!(f.client.try_allocate_fund(&f.pic, &id), Err(Ok(Error::NotAdmin.into())));
    assert_eq!(
        f.client.try_allocate_fund(&f.owner, &42),
        Err(Ok(Error::ProgramNotFound.into()))
    );
}

#[test]
fn test_deactivated_program_cannot_be_allocated() {
    let f = Fixture::new();
    let id = f.create_program(300);
    f.donate(300);
    f.client.deactivate_program(&f.owner, &id);

    assert_eq!(
        f.client.try_allocate_fund(&f.owner, &id),
        Err(Ok(Error::ProgramNotRegistered.into()))
    );
    assert_eq!(f.client.remaining_fund_for_allocation(), 300);
}

// ─────────────────────────────────────────────────────────
// Withdrawal
// ─────────────────────────────────────────────────────────

#[test]
fn test_withdraw_fund_scenario() {
    let f = Fixture::new();
    let id = f.create_program(1_000);
    f.donate(1_000);
    f.client.allocate_fund(&f.owner, &id);
    f.env.ledger().with_mut(|li| li.timestamp = 1_700_000_000);

    let before = f.token.balance(&f.pic);
    f.client.withdraw_fund(&f.pic, &id, &f.text("materials"), &400);

    assert_eq!(f.client.get_program(&id).allocated, 600);
    assert_eq!(f.token.balance(&f.pic) - before, 400);
    assert_eq!(f.token.balance(&f.client.address), 600);

    let history = f.client.get_program_history(&id);
    assert_eq!(history.len(), 1);
    let record = history.get(0).unwrap();
    assert_eq!(record.amount, 400);
    assert_eq!(record.history, f.text("materials"));
    assert_eq!(record.timestamp, 1_700_000_000);

    // Exceeding the remaining 600 leaves everything untouched.
    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("more"), &700),
        Err(Ok(Error::AmountExceedsAllocated.into()))
    );
    assert_eq!(f.client.get_program(&id).allocated, 600);
    assert_eq!(f.client.get_program_history(&id).len(), 1);
    assert_eq!(f.token.balance(&f.pic) - before, 400);
    assert_ledger_invariants(&f.client);
}

#[test]
fn test_withdraw_exact_remaining_succeeds() {
    let f = Fixture::new();
    let id = f.create_program(500);
    f.donate(500);
    f.client.allocate_fund(&f.owner, &id);

    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("all"), &501),
        Err(Ok(Error::AmountExceedsAllocated.into()))
    );
    f.client.withdraw_fund(&f.pic, &id, &f.text("all"), &500);

    assert_eq!(f.client.get_program(&id).allocated, 0);
    assert_eq!(f.token.balance(&f.pic), 500);
    assert_eq!(f.client.contract_balance(), 0);
}

#[test]
fn test_withdraw_guards() {
    let f = Fixture::new();
    let id = f.create_program(500);
    f.donate(500);
    f.client.allocate_fund(&f.owner, &id);

    assert_eq!(
        f.client.try_withdraw_fund(&f.owner, &id, &f.text("x"), &10),
        Err(Ok(Error::NotPic.into()))
    );
    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text(""), &10),
        Err(Ok(Error::EmptyHistory.into()))
    );
    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("x"), &0),
        Err(Ok(Error::InvalidAmount.into()))
    );
    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &99, &f.text("x"), &10),
        Err(Ok(Error::ProgramNotFound.into()))
    );
    assert_eq!(f.client.get_program_history(&id).len(), 0);
}

#[test]
fn test_withdraw_before_allocation_fails() {
    let f = Fixture::new();
    let id = f.create_program(500);
    f.donate(500);

    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("early"), &1),
        Err(Ok(Error::ProgramNotAllocated.into()))
    );
}

#[test]
fn test_deactivated_program_cannot_be_withdrawn_from() {
    let f = Fixture::new();
    let id = f.create_program(500);
    f.donate(500);
    f.client.allocate_fund(&f.owner, &id);
    f.client.deactivate_program(&f.owner, &id);

    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("after"), &100),
        Err(Ok(Error::ProgramNotAllocated.into()))
    );
    assert_eq!(f.client.get_program(&id).allocated, 500);
    assert_eq!(f.token.balance(&f.pic), 0);
}

#[test]
fn test_deactivating_allocated_program_strands_its_balance() {
    let f = Fixture::new();
    let id = f.create_program(500);
    f.donate(800);
    f.client.allocate_fund(&f.owner, &id);
    f.client.withdraw_fund(&f.pic, &id, &f.text("first tranche"), &200);
    f.client.deactivate_program(&f.owner, &id);

    // The undrawn 300 stays in custody but is neither withdrawable nor back in the pool.
    assert_eq!(f.client.get_program(&id).allocated, 300);
    assert_eq!(f.client.contract_balance(), 600);
    assert_eq!(f.client.remaining_fund_for_allocation(), 300);
    assert_eq!(f.client.total_allocated(), 500);

    assert_eq!(
        f.client.try_allocate_fund(&f.owner, &id),
        Err(Ok(Error::ProgramNotRegistered.into()))
    );
    assert_eq!(
        f.client.try_mark_program_as_finished(&f.owner, &id),
        Err(Ok(Error::ProgramNotAllocated.into()))
    );
    assert_eq!(
        f.client.try_withdraw_fund(&f.pic, &id, &f.text("late"), &300),
        Err(Ok(Error::ProgramNotAllocated.into()))
    );
    assert_ledger_invariants(&f.client);
}

#[test]
fn test_total_managed_overflow_is_rejected() {
    let f = Fixture::new();
    let id = f.create_program(i128::MAX);
    f.donate(i128::MAX);
    f.client.allocate_fund(&f.owner, &id);
    // Drain custody so the token balance can take another unit.
    f.client
        .withdraw_fund(&f.pic, &id, &f.text("everything"), &i128::MAX);
    assert_eq!(f.client.contract_balance(), 0);

    let late_donor = f.donor(1, 1);
    assert_eq!(
        f.client.try_send_fund(&late_donor, &1),
        Err(Ok(Error::Overflow.into()))
    );

    assert_eq!(f.client.total_managed_fund(), i128::MAX);
    assert_eq!(f.token.balance(&late_donor), 1);
    assert_eq!(f.client.contract_balance(), 0);
}

#[test]
fn test_pic_is_per_program() {
    let f = Fixture::new();
    let id = f.create_program(500);
    let other_pic = Address::generate(&f.env);
    let other = f
        .client
        .create_program(
            &f.owner,
            &ProgramInput {
                pic: other_pic.clone(),
                ..f.client.get_program(&id).into_input()
            },
        )
        .id;
    f.donate(1_000);
    f.client.allocate_fund(&f.owner, &id);
    f.client.allocate_fund(&f.owner, &other);

    assert_eq!(
        f.client.try_withdraw_fund(&other_pic, &id, &f.text("x"), &10),
        Err(Ok(Error::NotPic.into()))
    );
    f.client.withdraw_fund(&other_pic, &other, &f.text("x"), &10);
    assert_eq!(f.token.balance(&other_pic), 10);
}

// ─────────────────────────────────────────────────────────
// Aggregates
// ─────────────────────────────────────────────────────────

#[test]
fn test_fund_status_snapshot() {
    let f = Fixture::new();
    let id = f.create_program(400);
    f.donate(1_000);
    f.client.allocate_fund(&f.owner, &id);
    f.client.withdraw_fund(&f.pic, &id, &f.text("fuel"), &150);

    assert_eq!(
        f.client.get_fund_status(),
        FundStatus {
            total_managed: 1_000,
            total_allocated: 400,
            remaining_for_allocation: 600,
            contract_balance: 850,
        }
    );
}

#[test]
fn test_totals_never_decrease() {
    let f = Fixture::new();
    let ids = [f.create_program(200), f.create_program(300), f.create_program(900)];
    let mut last = Totals::default();

    let mut check = |f: &Fixture| {
        let now = assert_ledger_invariants(&f.client);
        assert_totals_monotonic(last, now);
        last = now;
    };

    f.donate(250);
    check(&f);
    f.client.allocate_fund(&f.owner, &ids[0]);
    check(&f);
    f.client.withdraw_fund(&f.pic, &ids[0], &f.text("a"), &200);
    check(&f);
    let _ = f.client.try_allocate_fund(&f.owner, &ids[1]);
    check(&f);
    f.donate(300);
    f.client.allocate_fund(&f.owner, &ids[1]);
    check(&f);
    f.client.withdraw_fund(&f.pic, &ids[1], &f.text("b"), &120);
    f.client.withdraw_fund(&f.pic, &ids[1], &f.text("c"), &80);
    check(&f);
    f.client.deactivate_program(&f.owner, &ids[2]);
    check(&f);
    f.client.mark_program_as_finished(&f.owner, &ids[0]);
    check(&f);

    assert_eq!(last, Totals { managed: 550, allocated: 500 });
    assert_eq!(f.client.contract_balance(), 150);
}

#[test]
fn test_history_is_append_only_and_ordered() {
    let f = Fixture::new();
    let id = f.create_program(1_000);
    f.donate(1_000);
    f.client.allocate_fund(&f.owner, &id);

    let notes = ["cement", "sand", "bricks", "transport"];
    for (i, note) in notes.iter().enumerate() {
        f.env
            .ledger()
            .with_mut(|li| li.timestamp = 1_000 + i as u64);
        f.client.withdraw_fund(&f.pic, &id, &f.text(note), &(100 * (i as i128 + 1)));
    }

    let history = f.client.get_program_history(&id);
    assert_eq!(history.len(), notes.len() as u32);
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.history, f.text(notes[i]));
        assert_eq!(record.amount, 100 * (i as i128 + 1));
        assert_eq!(record.timestamp, 1_000 + i as u64);
    }
    assert_eq!(f.client.get_program(&id).allocated, 0);
    assert_ledger_invariants(&f.client);
}

impl crate::Program {
    fn into_input(self) -> ProgramInput {
        ProgramInput {
            name: self.name,
            pic_name: self.pic_name,
            target: self.target,
            desc: self.desc,
            pic: self.pic,
            category: self.category,
            program_link: self.program_link,
            photo_url: self.photo_url,
        }
    }
}
