//! Parameter updates through the message server.

use assert_matches::assert_matches;
use coreum_feemodel::{
    Dec, Error, GenesisState, Keeper, KeeperConfig, MemStore, ModelParams, MsgServer,
    MsgUpdateParams, Params, ParamsError, Querier,
};

const GOV: &str = "core10d07y265gmmuvt4z0w9aw880jnsr700jgrnlvc";

fn keeper() -> Keeper<MemStore> {
    let mut keeper = Keeper::new(
        MemStore::new(),
        KeeperConfig {
            authority: GOV.to_string(),
        },
    );
    keeper
        .init_genesis(&GenesisState::new_default("ucore"))
        .unwrap();
    keeper
}

#[test]
fn test_new_params_apply_from_next_block() {
    let mut keeper = keeper();

    keeper.begin_block();
    keeper.track_gas(1_000_000).unwrap();
    assert_eq!(
        keeper.end_block().unwrap().min_gas_price.amount,
        "0.03125".parse::<Dec>().unwrap()
    );

    let params = Params::new(ModelParams {
        initial_gas_price: "0.1".parse().unwrap(),
        max_discount: "0.2".parse().unwrap(),
        ..Default::default()
    });
    MsgServer::new(&mut keeper)
        .update_params(MsgUpdateParams {
            authority: GOV.to_string(),
            params: params.clone(),
        })
        .unwrap();
    assert_eq!(Querier::new(&keeper).params().unwrap().params, params);

    keeper.begin_block();
    keeper.track_gas(1_000_000).unwrap();
    let outcome = keeper.end_block().unwrap();
    assert_eq!(outcome.min_gas_price.amount, "0.08".parse::<Dec>().unwrap());
    assert_eq!(outcome.min_gas_price.denom, "ucore");
}

#[test]
fn test_unauthorized_update_leaves_state_unchanged() {
    let mut keeper = keeper();
    let before = keeper.export_genesis().unwrap();

    let result = MsgServer::new(&mut keeper).update_params(MsgUpdateParams {
        authority: "core1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq".to_string(),
        params: Params::new(ModelParams {
            max_block_gas: 1,
            ..Default::default()
        }),
    });

    match result {
        Err(Error::InvalidSigner { expected, actual }) => {
            assert_eq!(expected, GOV);
            assert_eq!(actual, "core1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(keeper.export_genesis().unwrap(), before);
}

#[test]
fn test_invalid_update_is_rejected_before_storage() {
    let mut keeper = keeper();
    let result = MsgServer::new(&mut keeper).update_params(MsgUpdateParams {
        authority: GOV.to_string(),
        params: Params::new(ModelParams {
            short_ema_block_length: 1000,
            long_ema_block_length: 1000,
            ..Default::default()
        }),
    });

    assert_matches!(
        result,
        Err(Error::InvalidParams(ParamsError::LongEmaNotLongerThanShort {
            short: 1000,
            long: 1000
        }))
    );
    assert!(!result.unwrap_err().is_fatal());
    assert_eq!(keeper.params().unwrap(), Params::default());
}

#[test]
fn test_ceiling_beyond_exact_range_is_rejected() {
    let mut keeper = keeper();
    let result = MsgServer::new(&mut keeper).update_params(MsgUpdateParams {
        authority: GOV.to_string(),
        params: Params::new(ModelParams {
            max_gas_price_multiplier: "100000000000000000".parse().unwrap(),
            ..Default::default()
        }),
    });

    assert_matches!(
        result,
        Err(Error::InvalidParams(ParamsError::MaxGasPriceTooHigh { .. }))
    );
    assert_eq!(keeper.params().unwrap(), Params::default());

    // The largest ceiling still inside the range is stored and priced.
    let params = Params::new(ModelParams {
        max_gas_price_multiplier: "159999999999".parse().unwrap(),
        ..Default::default()
    });
    MsgServer::new(&mut keeper)
        .update_params(MsgUpdateParams {
            authority: GOV.to_string(),
            params: params.clone(),
        })
        .unwrap();
    assert_eq!(keeper.params().unwrap(), params);

    keeper.begin_block();
    keeper.track_gas(50_000_000).unwrap();
    let price = keeper.end_block().unwrap().min_gas_price.amount;
    assert!(price.is_exact());
    assert_eq!(price.to_string().parse::<Dec>().unwrap(), price);
}
