/*!

This is the long-form manual for `ballot_tabulation` and `tabulate`.

## Voting methods

The method is given by name, case insensitive:
* `FPTP` (alias `plurality`) first past the post
* `Approval`
* `RCV` (alias `irv`) and `STV` instant-runoff voting
* `Score`
* `Condorcet`

Every method reports every candidate of the roster exactly once, with a
competition rank: candidates that share a standing share a rank and the next
rank skips (`1, 1, 3`). Among equals, candidates keep the roster order, which
is the `displayOrder` of the candidates and then their order in the input.

### `FPTP`

One choice per ballot. The candidate with the most votes wins. Percentages
are shares of the ballots counted.

### `Approval`

Each ballot approves any number of candidates, possibly none. Percentages are
relative to the number of distinct voters, so they usually add up to more
than 100.

### `RCV` and `STV`

Ballots rank candidates, most preferred first. Each round, every ballot counts
for its highest-ranked candidate still running. A candidate with a majority of
the ballots still active (`active / 2 + 1`) wins. Otherwise every candidate
with the lowest tally is eliminated at once and the next round starts. There
is no secondary tie-break. If the last candidates are all eliminated together,
nobody wins.

`STV` is counted exactly like `RCV`: a single winner, no quota and no surplus
transfers.

The reported tally of a candidate is the one of the last round it took part
in. The percentage is computed against the active ballots of that round.

### `Score`

Each ballot gives a score between 0 and `maxScore` (10 by default) to any
number of candidates. The highest total wins. The percentage is relative to
the highest total: the leader always shows 100, and the figure is not a share
of the vote.

### `Condorcet`

Ballots rank candidates. For each pair of candidates, a ballot prefers the one
it ranks higher, and only counts if it ranks both. A candidate that beats
every other one head to head wins with 100 percent. Without such a candidate
(a cycle or a tie), nobody wins: every candidate shows the sum of its pairwise
wins with 0 percent and the note `no Condorcet winner found (cycle or ties)`.
That sum is not a ranking: all the candidates share the first rank, in roster
order.

## Invalid ballots

A ballot is left out of the count when it has the wrong shape for the method,
names the same candidate twice, names a candidate that is not on the roster,
or has a score that is not an integer in range. Nothing is repaired. The
summary reports how many ballots were left out and why.

## Input formats

### `json`

A JSON array where each element is a ballot: a string for `FPTP`, an array of
candidate ids for `Approval`, `RCV`, `STV` and `Condorcet`, and an object
mapping candidate ids to scores for `Score`. Ballots can also be given inline
in the `ballots` field of the configuration.

### `csv`

One ballot per row. For `FPTP` the choice is the only filled cell from the
first vote column on: a row with several choices is an invalid ballot. For the
other list methods, every column from the first vote column on is a choice, in
order, and blank cells are skipped.

```text
id,choice 1,choice 2,choice 3
v1,A,B,
v2,C,,
```

For `Score` the header row holds the candidate ids and each cell a score. A
blank cell means the candidate was not scored.

```text
id,A,B,C
v1,10,3,
v2,,7,7
```

## Configuration

```json
{
  "outputSettings": { "contestName": "Board election", "contestDate": "2024-11-05" },
  "method": "RCV",
  "candidates": [
    { "id": "A", "name": "Alice", "displayOrder": 1 },
    { "id": "B", "name": "Bob", "displayOrder": 2 }
  ],
  "ballotFileSources": [
    { "provider": "csv", "filePath": "ballots.csv", "firstVoteColumnIndex": 2,
      "firstVoteRowIndex": 2, "idColumnIndex": 1 }
  ],
  "turnout": { "eligibleVoters": 120, "distinctVoters": 87 },
  "rules": { "maxScore": 10 }
}
```

All the indexes are 1-based. `firstVoteRowIndex` defaults to 1 (no header)
and `firstVoteColumnIndex` to 1. Without an `idColumnIndex`, ballots are named
after their file and line. Without `turnout`, both figures default to the
number of ballots read.

 */
