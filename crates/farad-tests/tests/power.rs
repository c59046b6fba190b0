//! Power-token surface: wrap/unwrap, energy gating, rented-token
//! movement through rental agreements.

use farad_core::constants::ONE_TOKEN;
use farad_core::error::StationError;
use farad_tests::helpers::*;

#[test]
fn swap_in_and_out_round_trip() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    fund(&station, base_asset(), renter(), 100);

    station.swap_in(renter(), service, 100 * ONE_TOKEN, 0).unwrap();
    assert_eq!(station.balance_of(base_asset(), renter()), 0);
    assert_eq!(
        station.power_balance_of(service, renter()).unwrap(),
        100 * ONE_TOKEN
    );

    station.swap_out(renter(), service, 100 * ONE_TOKEN, 10).unwrap();
    assert_eq!(station.balance_of(base_asset(), renter()), 100 * ONE_TOKEN);
    assert_eq!(station.power_balance_of(service, renter()).unwrap(), 0);
}

#[test]
fn wrapped_energy_halves_toward_balance() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    fund(&station, base_asset(), renter(), 1_000);

    station.swap_in(renter(), service, 1_000 * ONE_TOKEN, 0).unwrap();
    // The service's gap half-life is one day.
    assert_eq!(station.energy_at(service, renter(), 0).unwrap(), 0);
    assert_eq!(
        station.energy_at(service, renter(), ONE_DAY).unwrap(),
        500 * ONE_TOKEN
    );
    assert_eq!(
        station.energy_at(service, renter(), 2 * ONE_DAY).unwrap(),
        750 * ONE_TOKEN
    );
}

#[test]
fn plain_transfers_disabled_until_enabled() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    fund(&station, base_asset(), renter(), 100);
    station.swap_in(renter(), service, 100 * ONE_TOKEN, 0).unwrap();

    let err = station
        .transfer_power(renter(), stranger(), service, ONE_TOKEN, 10 * ONE_DAY)
        .unwrap_err();
    assert_eq!(err, StationError::TransferDisabled);

    assert!(matches!(
        station.enable_transfer_forever(stranger(), service),
        Err(StationError::NotStationOwner)
    ));
    station.enable_transfer_forever(owner(), service).unwrap();

    station
        .transfer_power(renter(), stranger(), service, ONE_TOKEN, 10 * ONE_DAY)
        .unwrap();
    assert_eq!(
        station.power_balance_of(service, stranger()).unwrap(),
        ONE_TOKEN
    );
}

#[test]
fn transfer_gated_by_energy() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    station.enable_transfer_forever(owner(), service).unwrap();
    fund(&station, base_asset(), renter(), 1_000);
    station.swap_in(renter(), service, 1_000 * ONE_TOKEN, 0).unwrap();

    // One day in, half the balance is energized; moving more fails.
    assert_eq!(
        station.available_for_transfer(service, renter(), ONE_DAY).unwrap(),
        500 * ONE_TOKEN
    );
    let err = station
        .transfer_power(renter(), stranger(), service, 600 * ONE_TOKEN, ONE_DAY)
        .unwrap_err();
    assert!(matches!(
        err,
        StationError::InsufficientAvailableBalance { .. }
    ));
    station
        .transfer_power(renter(), stranger(), service, 500 * ONE_TOKEN, ONE_DAY)
        .unwrap();

    // The recipient's tokens arrive cold.
    assert_eq!(
        station.energy_at(service, stranger(), ONE_DAY).unwrap(),
        0
    );
}

#[test]
fn rented_tokens_move_only_with_their_agreement() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    station.enable_transfer_forever(owner(), service).unwrap();
    fund(&station, base_asset(), staker(), 10_000);
    fund(&station, base_asset(), renter(), 100);

    station.stake(staker(), 10_000 * ONE_TOKEN, 0).unwrap();
    let rental = station
        .rent(renter(), service, base_asset(), 100 * ONE_TOKEN, ONE_DAY, 100 * ONE_TOKEN, 0)
        .unwrap();

    // Direct transfer of rented tokens fails even fully energized.
    let err = station
        .transfer_power(renter(), stranger(), service, 100 * ONE_TOKEN, ONE_DAY / 2)
        .unwrap_err();
    assert!(matches!(
        err,
        StationError::InsufficientAvailableBalance { available: 0, .. }
    ));

    // Moving the agreement moves the tokens.
    station
        .transfer_rental(renter(), rental, stranger(), ONE_DAY / 2)
        .unwrap();
    assert_eq!(station.power_balance_of(service, renter()).unwrap(), 0);
    assert_eq!(
        station.power_balance_of(service, stranger()).unwrap(),
        100 * ONE_TOKEN
    );
    assert_eq!(
        station.get_rental_agreement(rental).unwrap().renter,
        stranger()
    );

    // The new holder returns it.
    station.return_rental(stranger(), rental, ONE_DAY / 2 + 1).unwrap();
    assert_eq!(station.power_balance_of(service, stranger()).unwrap(), 0);
}

#[test]
fn rental_transfer_blocked_when_transfers_disabled() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    fund(&station, base_asset(), staker(), 10_000);
    fund(&station, base_asset(), renter(), 100);

    station.stake(staker(), 10_000 * ONE_TOKEN, 0).unwrap();
    let rental = station
        .rent(renter(), service, base_asset(), 100 * ONE_TOKEN, ONE_DAY, 100 * ONE_TOKEN, 0)
        .unwrap();

    let err = station
        .transfer_rental(renter(), rental, stranger(), ONE_DAY / 2)
        .unwrap_err();
    assert_eq!(err, StationError::TransferDisabled);
}

#[test]
fn expired_rental_cannot_be_transferred() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    station.enable_transfer_forever(owner(), service).unwrap();
    fund(&station, base_asset(), staker(), 10_000);
    fund(&station, base_asset(), renter(), 100);

    station.stake(staker(), 10_000 * ONE_TOKEN, 0).unwrap();
    let rental = station
        .rent(renter(), service, base_asset(), 100 * ONE_TOKEN, ONE_DAY, 100 * ONE_TOKEN, 0)
        .unwrap();

    let err = station
        .transfer_rental(renter(), rental, stranger(), 2 * ONE_DAY)
        .unwrap_err();
    assert_eq!(err, StationError::RentalTransferNotAllowed);
}

#[test]
fn swap_out_of_rented_tokens_impossible() {
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    fund(&station, base_asset(), staker(), 10_000);
    fund(&station, base_asset(), renter(), 100);

    station.stake(staker(), 10_000 * ONE_TOKEN, 0).unwrap();
    station
        .rent(renter(), service, base_asset(), 100 * ONE_TOKEN, ONE_DAY, 100 * ONE_TOKEN, 0)
        .unwrap();

    let err = station
        .swap_out(renter(), service, ONE_TOKEN, 10)
        .unwrap_err();
    assert!(matches!(err, StationError::InsufficientBalance { .. }));
}

#[test]
fn transferred_tokens_can_be_swapped_out_immediately() {
    // Unwrapping needs no energy, only an unlocked balance.
    let station = new_station();
    let service = register_service(&station, 100 * ONE_TOKEN, 3 * ONE_TOKEN);
    station.enable_transfer_forever(owner(), service).unwrap();
    fund(&station, base_asset(), renter(), 100);

    station.swap_in(renter(), service, 100 * ONE_TOKEN, 0).unwrap();
    station
        .transfer_power(renter(), stranger(), service, 100 * ONE_TOKEN, 30 * ONE_DAY)
        .unwrap();
    station
        .swap_out(stranger(), service, 100 * ONE_TOKEN, 30 * ONE_DAY)
        .unwrap();
    assert_eq!(station.balance_of(base_asset(), stranger()), 100 * ONE_TOKEN);
}
